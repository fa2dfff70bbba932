pub mod http_repository;
pub mod instance_repository;
