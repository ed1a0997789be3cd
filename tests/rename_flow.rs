mod common;

use common::*;
use filebot::bot::Reply;
use filebot::storage::AreaKind;

#[tokio::test]
async fn rename_keeps_the_extension() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "work/notes.txt", b"n");

    let replies = texts(&say(&server, "/rnd notes").await);
    assert!(replies[0].starts_with("Type the new name"));
    assert_eq!(texts(&say(&server, "meeting summary").await), vec!["🔤 Renamed:\nwork/notes.txt → work/meeting_summary.txt"]);
    assert!(docs.join("work/meeting_summary.txt").exists());
}

#[tokio::test]
async fn alias_without_query_asks_for_one() {
    let (_tmp, server) = server().await;
    let pics = base(&server, AreaKind::Photos);
    touch(&pics, "IMG_001.jpg", b"i");

    assert_eq!(
        texts(&say(&server, "/renamep").await),
        vec!["Send part of the file name in Pictures that you'd like to rename (or type 'cancel')."]
    );
    say(&server, "img").await;
    assert_eq!(texts(&say(&server, "cat").await), vec!["🔤 Renamed:\nIMG_001.jpg → cat.jpg"]);
    assert!(pics.join("cat.jpg").exists());
}

#[tokio::test]
async fn ambiguous_target_by_button() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "cv_en.pdf", b"e");
    touch(&docs, "cv_es.pdf", b"s");

    let replies = say(&server, "/rnd cv").await;
    assert_eq!(texts(&replies)[0], "🔍 There are 2 matches:\n1. 📄 cv_en.pdf\n2. 📄 cv_es.pdf");
    let picked = press(&server, &buttons(&replies)[0]).await;
    assert_eq!(picked[2], Reply::EditText("File selected: cv_en.pdf".into()));
    assert!(picked[3].as_text().unwrap().starts_with("Type the new name"));

    assert_eq!(texts(&say(&server, "resume.pdf").await), vec!["🔤 Renamed:\ncv_en.pdf → resume.pdf"]);
}

#[tokio::test]
async fn collisions_and_directories_are_refused() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "a.txt", b"a");
    touch(&docs, "b.txt", b"b");
    std::fs::create_dir_all(docs.join("photos_2020")).unwrap();

    say(&server, "/rnd a.txt").await;
    assert_eq!(texts(&say(&server, "b").await), vec!["❌ A file with that name already exists at the destination."]);
    assert_eq!(std::fs::read(docs.join("b.txt")).unwrap(), b"b");

    // directories never show up as rename candidates
    assert_eq!(texts(&say(&server, "/rnd photos_2020").await), vec!["❌ No files found with that name."]);
}

#[tokio::test]
async fn cancel_stops_before_renaming() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);
    touch(&docs, "a.txt", b"a");

    say(&server, "/rnd a").await;
    assert_eq!(texts(&say(&server, "stop").await), vec!["Rename operation cancelled."]);
    assert!(docs.join("a.txt").exists());
}
