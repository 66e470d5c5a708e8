// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod account;
pub mod contact;
pub mod device;
pub mod session;

pub use account::Account;
pub use contact::EmergencyContact;
pub use device::DeviceInfo;
pub use session::Session;
