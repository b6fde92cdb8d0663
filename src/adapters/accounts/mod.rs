pub mod file_account_store;
