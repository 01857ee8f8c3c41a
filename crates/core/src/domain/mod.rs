pub mod decision;
pub mod exposure;
pub mod limits;
pub mod policy;
pub mod request;
