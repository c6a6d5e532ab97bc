#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! Instances of [testcontainers](https://docs.rs/testcontainers/latest/testcontainers/):
//!
//! * [`Speculos`] [Ledger device emulator](https://github.com/LedgerHQ/speculos) running the app
//!
//! and the [`DeviceModel`]s the app is built for.

mod device;
mod speculos;

pub use device::{DeviceModel, DEVICE_MODELS, FLEX, NANOS, NANOSP, NANOX, STAX};
pub use speculos::{Speculos, SpeculosArgs, APDU_PORT, API_PORT};

pub use testcontainers;
