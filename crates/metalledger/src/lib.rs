//! Metal inventory CLI.
//!
//! This crate provides the `mledger` command:
//!
//! - `mledger buy` / `mledger sell`: book purchases and sales against lots
//! - `mledger stock`, `lots`, `summary`, `history`: reports
//! - `mledger party` / `mledger expense`: counterparties and expenses
//! - `mledger export` / `import` / `backup`: data file management
//! - `mledger shell`: interactive session with periodic backups
//!
//! # Example Usage
//!
//! ```bash
//! mledger buy Copper 100 10 --source Acme --paid 1000
//! mledger sell Copper 40 15 --buyer Bob --paid 400 --due 200
//! mledger summary
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod format;
