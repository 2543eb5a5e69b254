pub const TIP_MESSAGE: &str = "Tip Cozmo when you see him - PayPal coming soon";
pub const GATE_BLOCKED: &str =
    "Please press the tip button OR check \"Not now, thank you\" before generating the forecast.";

/// One-way acknowledgment gate in front of forecast generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TipGate {
    #[default]
    Unacknowledged,
    Acknowledged,
}

impl TipGate {
    pub fn acknowledge(self) -> Self {
        TipGate::Acknowledged
    }

    pub fn is_acknowledged(&self) -> bool {
        matches!(self, TipGate::Acknowledged)
    }

    /// Generation proceeds once the tip was acknowledged or "not now" is checked.
    pub fn permits(&self, not_now: bool) -> bool {
        self.is_acknowledged() || not_now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_until_acknowledged_or_not_now() {
        let gate = TipGate::default();
        assert!(!gate.permits(false));
        assert!(gate.permits(true));

        let gate = gate.acknowledge();
        assert!(gate.permits(false));
        assert!(gate.permits(true));
    }

    #[test]
    fn acknowledge_is_idempotent() {
        let gate = TipGate::default().acknowledge().acknowledge();
        assert_eq!(gate, TipGate::Acknowledged);
    }
}
