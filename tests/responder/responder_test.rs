//! Tests for `responder::Responder`.

use checkup_bot::responder::{Command, Responder, ResponderConfig};
use checkup_bot::transport::{InboundMessage, OutboundMessage};

fn message(text: &str) -> InboundMessage {
    InboundMessage {
        text: text.to_owned(),
        sender_id: "U42".to_owned(),
        channel_id: "C7".to_owned(),
    }
}

fn responder() -> Responder {
    Responder::with_seed(ResponderConfig::default(), 42)
}

#[test]
fn greeting_is_typing_then_mention() {
    let replies = responder().respond(&message("Hi Bot, how are you"));
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0], OutboundMessage::typing("C7"));

    let OutboundMessage::Text { channel_id, text } = &replies[1] else {
        panic!("second reply should be text, got {:?}", replies[1]);
    };
    assert_eq!(channel_id, "C7");
    assert!(text.ends_with(" @U42!"), "unexpected greeting: {text}");
    let prefix = text.trim_end_matches(" @U42!");
    assert!(
        ["Hi", "Hello", "Howdy", "Wazzzup", "Hey"].contains(&prefix),
        "unexpected prefix: {prefix}"
    );
}

#[test]
fn greeting_triggers_are_case_insensitive() {
    let responder = responder();
    assert_eq!(responder.classify("HELLO BOT"), Some(Command::Greet));
    assert_eq!(responder.classify("hello bot!"), Some(Command::Greet));
    assert_eq!(responder.classify("hI bOt"), Some(Command::Greet));
}

#[test]
fn triggers_must_be_prefixes() {
    let responder = responder();
    assert_eq!(responder.classify("well, hi bot"), None);
    assert_eq!(responder.classify("please bot help"), None);
}

#[test]
fn help_replies_with_fixed_text() {
    let replies = responder().respond(&message("bot help please"));
    assert_eq!(
        replies,
        vec![OutboundMessage::text("C7", "How can I help you?")]
    );
}

#[test]
fn unrelated_text_produces_nothing() {
    assert!(responder()
        .respond(&message("completely unrelated text"))
        .is_empty());
}

#[test]
fn greeting_wins_over_help() {
    assert_eq!(responder().classify("hi bot help"), Some(Command::Greet));
}

#[test]
fn same_seed_same_greetings() {
    let a = Responder::with_seed(ResponderConfig::default(), 9);
    let b = Responder::with_seed(ResponderConfig::default(), 9);
    let from_a: Vec<String> = (0..20).map(|_| a.greeting("U1")).collect();
    let from_b: Vec<String> = (0..20).map(|_| b.greeting("U1")).collect();
    assert_eq!(from_a, from_b);
}

#[test]
fn every_prefix_gets_picked() {
    let responder = responder();
    let greetings: Vec<String> = (0..500).map(|_| responder.greeting("U1")).collect();
    for prefix in ["Hi", "Hello", "Howdy", "Wazzzup", "Hey"] {
        let expected = format!("{prefix} @U1!");
        assert!(
            greetings.contains(&expected),
            "prefix {prefix} never picked"
        );
    }
}

#[test]
fn custom_config_is_honoured() {
    let config = ResponderConfig {
        greeting_triggers: vec!["yo bot".to_owned()],
        help_trigger: "halp".to_owned(),
        greeting_prefixes: vec!["Ahoy".to_owned()],
        help_text: "Ask about uptime.".to_owned(),
    };
    let responder = Responder::with_seed(config, 1);

    assert!(responder.respond(&message("hi bot")).is_empty());
    assert_eq!(
        responder.respond(&message("Yo Bot")),
        vec![
            OutboundMessage::typing("C7"),
            OutboundMessage::text("C7", "Ahoy @U42!"),
        ]
    );
    assert_eq!(
        responder.respond(&message("HALP")),
        vec![OutboundMessage::text("C7", "Ask about uptime.")]
    );
}

#[test]
fn numeric_sender_ids_are_named_as_plain_text() {
    let config = ResponderConfig {
        greeting_prefixes: vec!["Hey".to_owned()],
        ..ResponderConfig::default()
    };
    let responder = Responder::with_seed(config, 3);

    let greeting = responder.greeting("123456789");

    assert_eq!(greeting, "Hey @123456789!");
    assert!(!greeting.contains("tg://"));
    assert!(!greeting.contains('<') && !greeting.contains('['));
}
