pub mod address_validator;
pub mod bytes;
pub mod hash;

pub use address_validator::AddressValidator;
