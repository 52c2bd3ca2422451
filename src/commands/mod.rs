// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod admin;
pub mod company;
pub mod directors;
pub mod doctor;
pub mod exporter;
pub mod reports;
pub mod shareholders;
pub mod transactions;
pub mod transfers;
