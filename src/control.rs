// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use portable_atomic::{AtomicBool, Ordering};

/// Activation flag shared between a long running loop and whoever owns its lifetime. Loops
/// check it once per iteration, so deactivation takes effect after the current sleep.
pub struct RunControl {
    active: AtomicBool,
}

impl RunControl {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}
