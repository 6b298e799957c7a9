// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition-only endpoint

pub mod handler;

pub use handler::ocr_handler;
