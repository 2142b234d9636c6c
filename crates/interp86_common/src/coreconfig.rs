/*
    interp86
    https://github.com/dbalsom/interp86

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    coreconfig.rs

    Interpreter configuration. Deserialized from TOML by embedders that keep
    their machine definition in a config file; `CoreConfig::default()` gives
    a plain 386-level core.

*/

use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// CPU generation the core should present to the guest. Gates the
/// architecture-versioned opcodes (CMPXCHG/XADD/BSWAP at 486, CPUID/RDTSC at
/// Pentium); anything below the gate decodes as an invalid opcode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, Display, EnumString)]
pub enum CpuLevel {
    #[strum(serialize = "386")]
    #[serde(rename = "386")]
    #[default]
    Cpu386,
    #[strum(serialize = "486")]
    #[serde(rename = "486")]
    Cpu486,
    #[strum(serialize = "pentium")]
    #[serde(rename = "pentium")]
    Pentium,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub cpu_level: CpuLevel,
    /// Log every encoding rejected as invalid before it is delivered to the
    /// guest as #UD. Useful when bringing up new guest software.
    pub trace_illegal: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            cpu_level: CpuLevel::default(),
            trace_illegal: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error parsing core configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl CoreConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let config = CoreConfig::from_toml(
            r#"
            cpu_level = "486"
            trace_illegal = true
            "#,
        )
        .unwrap();
        assert_eq!(config.cpu_level, CpuLevel::Cpu486);
        assert!(config.trace_illegal);
        assert!(CpuLevel::Cpu486 < CpuLevel::Pentium);
    }

    #[test]
    fn default_config() {
        let config = CoreConfig::from_toml("").unwrap();
        assert_eq!(config.cpu_level, CpuLevel::Cpu386);
        assert!(!config.trace_illegal);
    }
}
