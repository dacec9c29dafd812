use std::collections::HashSet;

use anyhow::Result;
use test_utils::history_titles;
use tokio::sync::mpsc;

use super::ConversationStore;
use crate::domain::models::Author;
use crate::domain::models::ChatError;
use crate::domain::models::Conversation;
use crate::domain::models::Event;

fn seeded_store() -> Result<ConversationStore> {
    let conversations = history_titles()
        .iter()
        .enumerate()
        .map(|(idx, title)| {
            return Conversation::new(&format!("{}", idx + 1), title);
        })
        .collect::<Vec<Conversation>>();

    return Ok(ConversationStore::with_conversations(
        conversations,
        Some("1"),
    )?);
}

mod create_conversation {
    use super::*;

    #[test]
    fn it_creates_and_selects_an_empty_conversation() -> Result<()> {
        let mut store = ConversationStore::new();
        assert!(store.current_id().is_none());

        let id = store.create_conversation(None);
        let conversation = store.current().unwrap();

        assert_eq!(store.current_id(), Some(id.as_str()));
        assert_eq!(conversation.title, "新对话");
        assert!(store.get_messages(&id)?.is_empty());

        return Ok(());
    }

    #[test]
    fn it_uses_the_given_title() {
        let mut store = ConversationStore::new();
        let id = store.create_conversation(Some("  Rust 学习计划 "));
        assert_eq!(store.get(&id).unwrap().title, "Rust 学习计划");

        let id = store.create_conversation(Some("   "));
        assert_eq!(store.get(&id).unwrap().title, "新对话");
    }

    #[test]
    fn it_generates_unique_ids() {
        let mut store = ConversationStore::new();
        let mut ids = HashSet::new();
        for _ in 0..10_000 {
            let id = store.create_conversation(None);
            assert!(ids.insert(id));
        }

        assert_eq!(store.count(), 10_000);
    }

    #[test]
    fn it_never_reuses_a_seeded_id() -> Result<()> {
        let mut store = seeded_store()?;
        let id = store.create_conversation(None);

        assert!(!["1", "2", "3"].contains(&id.as_str()));
        assert_eq!(store.count(), 4);

        return Ok(());
    }
}

mod with_conversations {
    use super::*;

    #[test]
    fn it_rejects_unknown_current_id() {
        let res = ConversationStore::with_conversations(
            vec![Conversation::new("1", "AI助手使用指南")],
            Some("missing"),
        );

        assert_eq!(
            res.err(),
            Some(ChatError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn it_starts_empty_without_conversations() -> Result<()> {
        let mut store = ConversationStore::with_conversations(vec![], None)?;
        assert!(store.current().is_none());
        assert_eq!(store.count(), 0);

        let id = store.create_conversation(None);
        assert_eq!(store.current_id(), Some(id.as_str()));

        return Ok(());
    }

    #[test]
    fn it_allows_no_current_conversation() -> Result<()> {
        let store =
            ConversationStore::with_conversations(vec![Conversation::new("1", "a")], None)?;
        assert!(store.current().is_none());
        assert_eq!(store.count(), 1);

        return Ok(());
    }

    #[test]
    fn it_lists_newest_first() -> Result<()> {
        let store = seeded_store()?;
        let titles = store
            .list()
            .iter()
            .map(|e| return e.title.to_string())
            .collect::<Vec<String>>();

        assert_eq!(
            titles,
            vec!["项目需求分析", "JavaScript学习计划", "AI助手使用指南"]
        );

        return Ok(());
    }
}

mod switch_to {
    use super::*;

    #[test]
    fn it_fails_for_unknown_id() -> Result<()> {
        let mut store = seeded_store()?;
        let res = store.switch_to("42");

        assert_eq!(res, Err(ChatError::NotFound("42".to_string())));
        assert_eq!(store.current_id(), Some("1"));

        return Ok(());
    }

    #[test]
    fn it_returns_each_conversations_own_messages() -> Result<()> {
        let mut store = seeded_store()?;
        for id in ["1", "2", "3"] {
            store.append_message(id, Author::User, &format!("message for {id}"))?;
        }

        for id in ["3", "1", "2"] {
            store.switch_to(id)?;
            let current = store.current_id().unwrap().to_string();
            let messages = store.get_messages(&current)?;

            assert_eq!(current, id);
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].text(), format!("message for {id}"));
        }

        return Ok(());
    }
}

mod append_message {
    use super::*;

    #[test]
    fn it_appends_in_order() -> Result<()> {
        let mut store = ConversationStore::new();
        let id = store.create_conversation(None);
        store.append_message(&id, Author::User, "你好")?;
        store.append_message(&id, Author::Assistant, "你好！很高兴与你交流。")?;

        let messages = store.get_messages(&id)?;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].author(), Author::User);
        assert_eq!(messages[1].author(), Author::Assistant);

        return Ok(());
    }

    #[test]
    fn it_stores_text_exactly_as_given() -> Result<()> {
        let mut store = ConversationStore::new();
        let id = store.create_conversation(None);
        let text = "fn main() {\n\tprintln!();\n}";
        store.append_message(&id, Author::User, text)?;

        assert_eq!(store.get_messages(&id)?[0].text(), text);

        return Ok(());
    }

    #[test]
    fn it_rejects_blank_user_text() {
        let mut store = ConversationStore::new();
        let id = store.create_conversation(None);

        for text in ["", "   ", "\n\t"] {
            let res = store.append_message(&id, Author::User, text);
            assert!(matches!(res, Err(ChatError::InvalidInput(_))));
        }
        assert!(store.get_messages(&id).unwrap().is_empty());
    }

    #[test]
    fn it_trusts_assistant_text() -> Result<()> {
        let mut store = ConversationStore::new();
        let id = store.create_conversation(None);
        store.append_message(&id, Author::Assistant, "")?;

        assert_eq!(store.get_messages(&id)?.len(), 1);

        return Ok(());
    }

    #[test]
    fn it_fails_for_unknown_id() {
        let mut store = ConversationStore::new();
        let res = store.append_message("nope", Author::Assistant, "hi");
        assert_eq!(res, Err(ChatError::NotFound("nope".to_string())));
    }
}

mod clear {
    use super::*;

    #[test]
    fn it_empties_messages_keeping_title_and_id() -> Result<()> {
        let mut store = seeded_store()?;
        store.append_message("2", Author::User, "JavaScript 怎么学？")?;
        store.append_message("2", Author::Assistant, "学习新技能是一个很好的想法！")?;

        store.clear("2")?;
        let conversation = store.get("2").unwrap();

        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.id, "2");
        assert_eq!(conversation.title, "JavaScript学习计划");

        return Ok(());
    }

    #[test]
    fn it_fails_for_unknown_id() {
        let mut store = ConversationStore::new();
        assert_eq!(store.clear("x"), Err(ChatError::NotFound("x".to_string())));
    }
}

mod rename {
    use super::*;

    #[test]
    fn it_renames() -> Result<()> {
        let mut store = seeded_store()?;
        store.rename("3", " 需求评审 ")?;
        assert_eq!(store.get("3").unwrap().title, "需求评审");

        return Ok(());
    }

    #[test]
    fn it_rejects_empty_title() -> Result<()> {
        let mut store = seeded_store()?;
        let res = store.rename("3", "  ");

        assert!(matches!(res, Err(ChatError::InvalidInput(_))));
        assert_eq!(store.get("3").unwrap().title, "项目需求分析");

        return Ok(());
    }
}

mod subscribe {
    use super::*;

    #[test]
    fn it_notifies_on_every_mutation() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let mut store = ConversationStore::new();
        store.subscribe(tx);

        let id = store.create_conversation(None);
        store.append_message(&id, Author::User, "你好")?;
        store.rename(&id, "问候")?;
        store.clear(&id)?;
        store.switch_to(&id)?;

        for _ in 0..5 {
            assert_eq!(rx.try_recv()?, Event::StateChanged(id.to_string()));
        }
        assert!(rx.try_recv().is_err());

        return Ok(());
    }

    #[test]
    fn it_does_not_notify_on_rejected_input() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let mut store = seeded_store()?;
        store.subscribe(tx);

        assert!(store.append_message("1", Author::User, " ").is_err());
        assert!(store.switch_to("missing").is_err());
        assert!(rx.try_recv().is_err());

        return Ok(());
    }

    #[test]
    fn it_prunes_closed_observers() {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();
        let mut store = ConversationStore::new();
        store.subscribe(tx);
        drop(rx);

        store.create_conversation(None);
        assert!(store.observers.is_empty());
    }
}
