pub mod company;
pub mod document;
pub mod industry;
pub mod scope;
