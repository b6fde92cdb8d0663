pub mod account;
pub mod decoded_message;
pub mod key_ring;
pub mod profile;
