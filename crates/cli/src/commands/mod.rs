pub mod consensus;
pub mod convert;
pub mod init;
pub mod run;
