mod common;

use common::*;
use filebot::bot::{Inbound, Reply, Upload};
use filebot::storage::AreaKind;

const STRANGER: i64 = 777;

#[tokio::test]
async fn strangers_are_rejected_before_routing() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "secret.txt", b"s");

    let replies = server.handle(Inbound::text(STRANGER, "/rmd secret")).await;
    assert_eq!(replies, vec![Reply::text("❌ Not authorized")]);

    let replies = server.handle(Inbound::callback(STRANGER, "OPS|DEL|docs|YES|secret.txt")).await;
    assert_eq!(replies, vec![Reply::alert("❌ Not authorized")]);

    let upload = Upload {
        kind: AreaKind::Documents,
        unique_id: "u1".into(),
        file_name: Some("evil.sh".into()),
        caption: None,
        media_group_id: None,
        size: Some(10),
    };
    assert_eq!(server.handle(Inbound::upload(STRANGER, upload)).await, vec![Reply::text("❌ Not authorized")]);
    assert!(docs.join("secret.txt").exists());
}

#[tokio::test]
async fn stranger_cannot_touch_owner_session() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "keep.txt", b"k");

    let confirm = say(&server, "/rmd keep").await;
    let yes = buttons(&confirm)[0].clone();
    server.handle(Inbound::callback(STRANGER, yes.clone())).await;
    assert!(docs.join("keep.txt").exists());

    // the owner's pending confirmation is still intact
    let done = press(&server, &yes).await;
    assert_eq!(done[1], Reply::EditText("🗑️ Deleted: keep.txt".into()));
}

#[tokio::test]
async fn help_and_unknown_commands() {
    let (_tmp, server) = server().await;
    let help = texts(&say(&server, "/start").await);
    assert!(help[0].contains("/rmd"));
    assert!(help[0].contains("/mvp"));

    assert_eq!(
        texts(&say(&server, "/reboot").await),
        vec!["❌ Unknown command: /reboot. Use /start to see the available list."]
    );
    assert_eq!(texts(&say(&server, "hello there").await), vec![server.texts().not_understood()]);
}

#[tokio::test]
async fn unrecognised_callbacks_get_an_alert() {
    let (_tmp, server) = server().await;
    for data in ["", "garbage", "OPS|NOPE|docs|1", "FB|videos|a.mp4", "OPS|DELSEL|docs|x"] {
        assert_eq!(press(&server, data).await, vec![Reply::alert("Unrecognised action.")], "{data}");
    }
}

#[tokio::test]
async fn pick_for_another_area_is_invalid() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "r1.txt", b"1");
    touch(&docs, "r2.txt", b"2");

    say(&server, "/rmd r").await;
    assert_eq!(press(&server, "OPS|DELSEL|photos|0").await, vec![Reply::alert("Invalid context")]);
    assert_eq!(press(&server, "OPS|DELSEL|docs|9").await, vec![Reply::alert("Index out of range")]);
    // still waiting for a choice
    let confirm = texts(&say(&server, "1").await);
    assert_eq!(confirm, vec!["Delete 📄 r1.txt? This action cannot be undone."]);
}

#[tokio::test]
async fn starting_a_flow_only_resets_its_own_context() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "m1.txt", b"1");
    touch(&docs, "m2.txt", b"2");
    std::fs::create_dir_all(docs.join("dest")).unwrap();

    say(&server, "/mvd").await;
    say(&server, "/rmd m").await;
    // the delete flow takes precedence for replies
    assert_eq!(texts(&say(&server, "cancel").await), vec!["Operation cancelled."]);
    // the move flow is still waiting for its origin
    let next = texts(&say(&server, "m1").await);
    assert!(next[0].starts_with("Now send part of the destination folder name"));
}

#[tokio::test]
async fn mkdir_creates_nested_folders_inside_the_area() {
    let (_tmp, server) = server().await;
    let pics = base(&server, AreaKind::Photos);

    assert_eq!(texts(&say(&server, "/mkdirp 2024/summer").await), vec!["📁 Directory created: 2024/summer"]);
    assert!(pics.join("2024/summer").is_dir());
    assert_eq!(texts(&say(&server, "/mkdird").await), vec!["⚠️ Use: /mkdird <name/directory>"]);
    let escaped = texts(&say(&server, "/mkdirp ../../escape").await);
    assert!(escaped[0].starts_with("❌ Path outside the base directory"));
}

#[tokio::test]
async fn startup_notice_follows_config() {
    let (_tmp, server) = server().await;
    assert_eq!(server.startup_notice(), Some("✅ Server online"));
    assert!(server.is_authorized(OWNER));
    assert!(!server.is_authorized(STRANGER));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_confirmations_delete_once() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "notes.txt", b"n");

    let yes = buttons(&say(&server, "/rmd notes").await)[0].clone();
    let server = std::sync::Arc::new(server);
    let first = tokio::spawn({
        let (server, yes) = (server.clone(), yes.clone());
        async move { server.handle(Inbound::callback(OWNER, yes)).await }
    });
    let second = tokio::spawn({
        let server = server.clone();
        async move { server.handle(Inbound::callback(OWNER, yes)).await }
    });
    let (first, second) = tokio::join!(first, second);

    let mut outcomes: Vec<Reply> = [first.unwrap(), second.unwrap()].into_iter().map(|r| r[1].clone()).collect();
    outcomes.sort_by_key(|r| format!("{:?}", r));
    assert_eq!(
        outcomes,
        vec![Reply::EditText("Operation cancelled.".into()), Reply::EditText("🗑️ Deleted: notes.txt".into())]
    );
    assert!(!docs.join("notes.txt").exists());
}
