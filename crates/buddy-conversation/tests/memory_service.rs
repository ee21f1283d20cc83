use buddy_conversation::{
    format_conversation_history_for_prompt, ConversationMemoryService, ConversationStore,
    MAX_MESSAGES_PER_USER, NO_HISTORY_SUMMARY,
};
use buddy_core::MessageRole;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn service_in(dir: &TempDir) -> ConversationMemoryService {
    let service = ConversationMemoryService::new(ConversationStore::new(dir.path()));
    service.initialize_conversation_memory();
    service
}

#[test]
fn test_history_is_bounded_and_keeps_most_recent() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    for i in 1..=35 {
        service.add_user_message(1, format!("Message {i}"));
    }

    let history = service.get_user_conversation_history(1);
    assert_eq!(history.len(), MAX_MESSAGES_PER_USER);
    assert_eq!(history[0].content, "Message 6");
    assert_eq!(history[29].content, "Message 35");
}

#[test]
fn test_bound_below_limit() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    for i in 0..7 {
        service.add_user_message(1, format!("m{i}"));
    }

    assert_eq!(service.get_user_conversation_history(1).len(), 7);
}

#[test]
fn test_users_are_isolated() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    service.add_user_message(1, "Ik heb vandaag gewandeld");
    service.add_assistant_message(1, "Goed zo!");
    service.add_user_message(2, "Hoi");
    service.set_conversation_summary(2, "Custom");

    service.clear_user_conversation(2);

    let history = service.get_user_conversation_history(1);
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, "Goed zo!");
    assert_eq!(service.get_conversation_summary(1), NO_HISTORY_SUMMARY);
}

#[test]
fn test_clear_is_total() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    service.add_user_message(3, "Mijn doel is om 10 kg af te vallen dit jaar");
    service.set_conversation_summary(3, "Goal: 10 kg");
    service.clear_user_conversation(3);

    assert!(service.get_user_conversation_history(3).is_empty());
    assert_eq!(service.get_conversation_summary(3), NO_HISTORY_SUMMARY);
}

#[test]
fn test_never_messaged_user_has_sentinel_summary() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    assert_eq!(service.get_conversation_summary(404), NO_HISTORY_SUMMARY);
    assert!(service.get_user_conversation_history(404).is_empty());
}

#[test]
fn test_weight_loss_is_summarized_on_tenth_message() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    service.add_user_message(7, "Ik ben 5 kg afgevallen deze maand!");
    for i in 0..9 {
        if i % 2 == 0 {
            service.add_assistant_message(7, "Fantastisch, ga zo door!");
        } else {
            service.add_user_message(7, "Dank je!");
        }
    }

    assert!(service.get_conversation_summary(7).contains("Lost 5 kg"));
}

#[test]
fn test_explicit_summary_is_never_overwritten() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    service.set_conversation_summary(8, "X");
    for i in 0..25 {
        service.add_user_message(8, format!("Ik ben {i} kg afgevallen"));
    }

    assert_eq!(service.get_conversation_summary(8), "X");
}

#[test]
fn test_memory_survives_restart() {
    let dir = TempDir::new().unwrap();
    service_in(&dir).add_user_message(9, "Hallo");

    let reopened = service_in(&dir);
    let history = reopened.get_user_conversation_history(9);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "Hallo");
}

#[test]
fn test_format_contains_header_only_for_real_summary() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);
    service.add_user_message(10, "Hoe gaat het?");

    let history = service.get_user_conversation_history(10);
    let summary = service.get_conversation_summary(10);
    let formatted = format_conversation_history_for_prompt(&history, Some(&summary));
    assert!(!formatted.contains("Conversation Summary:"));
    assert!(formatted.starts_with("Recent conversation:\nUser: Hoe gaat het?"));

    let formatted = format_conversation_history_for_prompt(&history, Some("Recent topics: dieet"));
    assert!(formatted.starts_with("Conversation Summary: Recent topics: dieet\n\n"));
}

#[test]
fn test_concurrent_writers_do_not_lose_messages() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(service_in(&dir));

    let handles: Vec<_> = (0..4)
        .map(|user_id| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for i in 0..5 {
                    service.add_user_message(user_id, format!("bericht {i}"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for user_id in 0..4 {
        assert_eq!(service.get_user_conversation_history(user_id).len(), 5);
    }
}

#[test]
fn test_write_failure_is_logged_not_raised() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "occupied").unwrap();

    let store = ConversationStore::new(&blocker);
    assert!(store.try_initialize().is_err());

    let service = ConversationMemoryService::new(ConversationStore::new(&blocker));
    service.initialize_conversation_memory();
    service.add_user_message(1, "Ik heb 2 kg verloren");

    assert!(service.store().load().is_empty());
    assert!(service.get_user_conversation_history(1).is_empty());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "occupied");
}

#[test]
fn test_legacy_entry_is_rewritten_in_current_shape() {
    let dir = TempDir::new().unwrap();
    let store = ConversationStore::new(dir.path());
    fs::write(
        store.file_path(),
        r#"{"5":[{"role":"user","content":"Hoi","timestamp":"2024-01-01T08:00:00Z"}]}"#,
    )
    .unwrap();

    let service = ConversationMemoryService::new(store);
    service.add_user_message(5, "Nog een bericht");

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(service.store().file_path()).unwrap()).unwrap();
    let entry = &raw["5"];
    assert!(entry.is_object());
    assert_eq!(entry["messages"].as_array().unwrap().len(), 2);
    assert!(entry["summary"].is_string());
    assert!(entry["lastSummaryUpdate"].is_string());
}

#[test]
fn test_concurrent_exchanges_stay_paired() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(service_in(&dir));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let service = service.clone();
            thread::spawn(move || {
                for i in 0..3 {
                    service.add_exchange(9, format!("vraag {t}-{i}"), format!("antwoord {t}-{i}"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let history = service.get_user_conversation_history(9);
    assert_eq!(history.len(), 24);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role, MessageRole::User);
        assert_eq!(pair[1].role, MessageRole::Assistant);
        assert_eq!(pair[0].content.replace("vraag", ""), pair[1].content.replace("antwoord", ""));
    }
}
