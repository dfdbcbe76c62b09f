//! Integration tests for events

#[cfg(test)]
mod tests {
    use gitpm_events::*;
    use gitpm_types::InstallStatus;

    #[tokio::test]
    async fn test_event_sender_emit() {
        let (tx, mut rx) = channel();

        tx.emit_error("test error");
        tx.emit_debug("test debug");

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.event,
            AppEvent::General(GeneralEvent::Error { .. })
        ));
        assert_eq!(first.meta.level, EventLevel::Error);

        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second.event,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));
        assert_eq!(second.meta.level, EventLevel::Debug);
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored");
    }

    #[tokio::test]
    async fn test_package_events_carry_correlation() {
        let (tx, mut rx) = channel();
        tx.emit_for_package(
            "com.foo",
            AppEvent::Package(PackageEvent::UninstallFailed {
                package: "com.foo".into(),
                failure: FailureContext::new(None::<String>, "network error", None::<String>, true),
                reverted_to: InstallStatus::Installed,
            }),
        );

        let message = rx.recv().await.unwrap();
        assert_eq!(message.meta.correlation_id.as_deref(), Some("com.foo"));
        assert_eq!(message.meta.source, EventSource::UNINSTALL);
        assert_eq!(message.meta.level, EventLevel::Error);
    }

    #[test]
    fn test_disabled_emitter_is_silent() {
        let emitter: Option<EventSender> = None;
        emitter.emit_warning("nobody listens");
        assert!(emitter.event_sender().is_none());
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = AppEvent::Package(PackageEvent::ListCompleted {
            installed: 3,
            matched: 1,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "package");
        assert_eq!(json["event"]["type"], "ListCompleted");
        assert_eq!(json["event"]["matched"], 1);
    }
}
