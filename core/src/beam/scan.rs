use crate::prelude::ScanType;
use crate::pulse_interface::ScanMode;

/// Two-state PPI/RHI tracker driven by the scan mode declared on each pulse.
#[derive(Debug, Clone)]
pub struct ScanModeDetector {
    current: ScanType,
}

impl Default for ScanModeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanModeDetector {
    pub fn new() -> Self {
        Self {
            current: ScanType::Ppi,
        }
    }

    pub fn current(&self) -> ScanType {
        self.current
    }

    /// Returns true when the pulse switches the scan type.
    pub fn observe(&mut self, scan_mode: ScanMode) -> bool {
        let scan_type = scan_mode.scan_type();
        if scan_type == self.current {
            return false;
        }
        self.current = scan_type;
        true
    }
}
