mod common;

use common::*;
use filebot::bot::Reply;
use filebot::storage::AreaKind;

#[tokio::test]
async fn direct_move_into_folder() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "a.txt", b"a");
    std::fs::create_dir_all(docs.join("archive")).unwrap();

    let replies = say(&server, "/mvd a.txt archive").await;
    assert_eq!(texts(&replies), vec!["📦 Moved:\na.txt → archive/a.txt"]);
    assert!(docs.join("archive/a.txt").exists());
    assert!(!docs.join("a.txt").exists());
}

#[tokio::test]
async fn assistant_with_single_matches() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "budget.xlsx", b"b");
    std::fs::create_dir_all(docs.join("Finance")).unwrap();

    assert_eq!(
        texts(&say(&server, "/mvd").await),
        vec!["Send part of the source name in Documents (or type 'cancel')."]
    );
    let next = texts(&say(&server, "budget").await);
    assert!(next[0].starts_with("Now send part of the destination folder name in Documents"));
    assert_eq!(texts(&say(&server, "fin").await), vec!["📦 Moved:\nbudget.xlsx → Finance/budget.xlsx"]);
    assert!(docs.join("Finance/budget.xlsx").exists());

    // flow is over
    assert_eq!(texts(&say(&server, "fin").await), vec![server.texts().not_understood()]);
}

#[tokio::test]
async fn origin_argument_starts_the_search() {
    let (_tmp, server) = server().await;
    let pics = base(&server, AreaKind::Photos);
    touch(&pics, "trip/beach.jpg", b"j");

    let replies = texts(&say(&server, "/mvp beach").await);
    assert!(replies[0].starts_with("Now send part of the destination folder name in Pictures"));
    assert_eq!(texts(&say(&server, ".").await), vec!["📦 Moved:\ntrip/beach.jpg → beach.jpg"]);
    assert!(pics.join("beach.jpg").exists());
}

#[tokio::test]
async fn ambiguous_destination_is_picked_with_a_button() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "draft.md", b"d");
    std::fs::create_dir_all(docs.join("2023")).unwrap();
    std::fs::create_dir_all(docs.join("projects/2024")).unwrap();

    say(&server, "/mvd draft").await;
    let replies = say(&server, "20").await;
    assert_eq!(texts(&replies)[0], "🔍 Possible destinations (2):\n1. 📂 2023\n2. 📂 projects/2024");

    let picked = press(&server, &buttons(&replies)[1]).await;
    assert_eq!(picked[1], Reply::ClearKeyboard);
    assert_eq!(picked[2], Reply::EditText("Selected: projects/2024".into()));
    assert_eq!(picked[3].as_text(), Some("📦 Moved:\ndraft.md → projects/2024/draft.md"));
    assert!(docs.join("projects/2024/draft.md").exists());
}

#[tokio::test]
async fn ambiguous_origin_by_number() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "log1.txt", b"1");
    touch(&docs, "log2.txt", b"2");
    std::fs::create_dir_all(docs.join("old")).unwrap();

    say(&server, "/mvd").await;
    let list = say(&server, "log").await;
    assert_eq!(texts(&list)[0], "🔍 Matches for the source (2):\n1. 📄 log1.txt\n2. 📄 log2.txt");
    assert_eq!(texts(&say(&server, "7").await), vec!["⚠️ Number out of range."]);
    say(&server, "2").await;
    assert_eq!(texts(&say(&server, "old").await), vec!["📦 Moved:\nlog2.txt → old/log2.txt"]);
}

#[tokio::test]
async fn existing_target_is_never_overwritten() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "a.txt", b"new");
    touch(&docs, "dir/a.txt", b"old");

    let replies = say(&server, "/mvd a.txt dir").await;
    assert_eq!(texts(&replies), vec!["❌ A file with that name already exists at the destination."]);
    assert_eq!(std::fs::read(docs.join("dir/a.txt")).unwrap(), b"old");
    assert!(docs.join("a.txt").exists());
}

#[tokio::test]
async fn guard_errors_are_reported() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "a.txt", b"a");

    assert_eq!(texts(&say(&server, "/mvd a.txt .").await), vec!["⚠️ The destination is the same as the source."]);
    assert_eq!(texts(&say(&server, "/mvd a.txt missing/b.txt").await), vec!["❌ The destination directory doesn't exist."]);
    assert_eq!(texts(&say(&server, "/mvd ghost.txt .").await), vec!["❌ Does not exist: ghost.txt"]);
    let escaped = texts(&say(&server, "/mvd a.txt ../../etc").await);
    assert!(escaped[0].starts_with("❌ Path outside the base directory"));
    assert!(docs.join("a.txt").exists());
}

#[tokio::test]
async fn cancel_in_any_stage() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "a.txt", b"a");

    say(&server, "/mvd a.txt").await;
    assert_eq!(texts(&say(&server, "salir").await), vec!["Move operation cancelled."]);
    assert!(docs.join("a.txt").exists());
}

#[tokio::test]
async fn too_many_arguments_show_usage() {
    let (_tmp, server) = server().await;
    let replies = texts(&say(&server, "/mvp a b c").await);
    assert!(replies[0].starts_with("⚠️ Use: /mvp <origin> <destination>"));
}
