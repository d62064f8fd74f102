pub mod init;
pub mod serve;
