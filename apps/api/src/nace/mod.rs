//! NACE Rev. 2 reference data: parsing the source document and seeding the
//! database.

pub mod parser;
pub mod seed;
