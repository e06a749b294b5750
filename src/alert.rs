use tokio::sync::watch;

/// Visual style of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertVariant {
    Danger,
    Success,
}

/// Contents of the single alert slot.
///
/// A closed alert carries no header, text or variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alert {
    pub is_open: bool,
    pub header: Option<String>,
    pub text: Option<String>,
    pub variant: Option<AlertVariant>,
}

/// Single-slot notification surface shared by the whole console.
///
/// While an alert is open every further `show_*` call is dropped; nothing is
/// queued. Consumers observe the slot through [`AlertChannel::subscribe`].
#[derive(Debug)]
pub struct AlertChannel {
    slot: watch::Sender<Alert>,
}

impl Default for AlertChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertChannel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: watch::Sender::new(Alert::default()),
        }
    }

    /// Open a danger alert. Returns `false` if another alert was already open.
    pub fn show_danger(&self, header: impl Into<String>, text: impl Into<String>) -> bool {
        self.show(AlertVariant::Danger, header.into(), text.into())
    }

    /// Open a success alert. Returns `false` if another alert was already open.
    pub fn show_success(&self, header: impl Into<String>, text: impl Into<String>) -> bool {
        self.show(AlertVariant::Success, header.into(), text.into())
    }

    fn show(&self, variant: AlertVariant, header: String, text: String) -> bool {
        let shown = self.slot.send_if_modified(|alert| {
            if alert.is_open {
                return false;
            }
            *alert = Alert {
                is_open: true,
                header: Some(header.clone()),
                text: Some(text.clone()),
                variant: Some(variant),
            };
            true
        });
        if !shown {
            tracing::debug!(header = %header, "Alert dropped, slot already open");
        }
        shown
    }

    /// Clear the slot. Closing an already closed slot changes nothing.
    pub fn close(&self) {
        self.slot.send_if_modified(|alert| {
            if !alert.is_open {
                return false;
            }
            *alert = Alert::default();
            true
        });
    }

    /// Snapshot of the slot.
    #[must_use]
    pub fn current(&self) -> Alert {
        self.slot.borrow().clone()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.slot.borrow().is_open
    }

    /// Watch the slot for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Alert> {
        self.slot.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_opens_closed_slot() {
        let alerts = AlertChannel::new();
        assert!(alerts.show_danger("Error", "boom"));

        let alert = alerts.current();
        assert!(alert.is_open);
        assert_eq!(alert.header.as_deref(), Some("Error"));
        assert_eq!(alert.text.as_deref(), Some("boom"));
        assert_eq!(alert.variant, Some(AlertVariant::Danger));
    }

    #[test]
    fn show_while_open_is_noop() {
        let alerts = AlertChannel::new();
        alerts.show_success("Saved", "user created");
        let before = alerts.current();

        assert!(!alerts.show_danger("Error", "second"));
        assert_eq!(alerts.current(), before);
    }

    #[test]
    fn close_resets_all_fields() {
        let alerts = AlertChannel::new();
        alerts.show_danger("Error", "boom");
        alerts.close();

        assert_eq!(alerts.current(), Alert::default());
        assert!(alerts.current().header.is_none());
        assert!(alerts.current().text.is_none());
        assert!(alerts.current().variant.is_none());
    }

    #[test]
    fn close_is_idempotent() {
        let alerts = AlertChannel::new();
        alerts.close();
        alerts.close();
        assert!(!alerts.is_open());
    }

    #[test]
    fn slot_reopens_after_close() {
        let alerts = AlertChannel::new();
        alerts.show_danger("Error", "first");
        alerts.close();
        assert!(alerts.show_success("Done", "second"));
        assert_eq!(alerts.current().text.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let alerts = AlertChannel::new();
        let mut rx = alerts.subscribe();

        alerts.show_danger("Error", "boom");
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_open);

        alerts.show_danger("Error", "dropped");
        assert!(!rx.has_changed().unwrap());
    }
}
