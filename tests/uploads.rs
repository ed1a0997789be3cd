mod common;

use common::*;
use filebot::bot::{Inbound, Reply, Upload};
use filebot::storage::AreaKind;

fn photo(uid: &str, caption: Option<&str>, group: Option<&str>) -> Upload {
    Upload {
        kind: AreaKind::Photos,
        unique_id: uid.into(),
        file_name: None,
        caption: caption.map(str::to_string),
        media_group_id: group.map(str::to_string),
        size: Some(1024),
    }
}

fn document(name: Option<&str>, caption: Option<&str>, size: u64) -> Upload {
    Upload {
        kind: AreaKind::Documents,
        unique_id: "AgADdoc".into(),
        file_name: name.map(str::to_string),
        caption: caption.map(str::to_string),
        media_group_id: None,
        size: Some(size),
    }
}

fn save(replies: &[Reply]) -> (std::path::PathBuf, Option<String>) {
    match replies {
        [Reply::Save { dest, notice }] => (dest.clone(), notice.clone()),
        other => panic!("expected a single save, got {:?}", other),
    }
}

#[tokio::test]
async fn photo_without_caption_gets_default_name() {
    let (_tmp, server) = server().await;
    let pics = base(&server, AreaKind::Photos);

    let (dest, notice) = save(&server.handle(Inbound::upload(OWNER, photo("AgADx1", None, None))).await);
    assert_eq!(dest, pics.join("pic_AgADx1.jpg"));
    assert_eq!(notice.as_deref(), Some("🖼️ Images saved in:\nPictures"));
}

#[tokio::test]
async fn caption_names_the_file() {
    let (_tmp, server) = server().await;
    let pics = base(&server, AreaKind::Photos);

    let (dest, _) = save(&server.handle(Inbound::upload(OWNER, photo("u", Some("sunset at sea"), None))).await);
    assert_eq!(dest, pics.join("sunset_at_sea.jpg"));
}

#[tokio::test]
async fn folder_flag_redirects_the_whole_album() {
    let (_tmp, server) = server().await;
    let pics = base(&server, AreaKind::Photos);

    let first = server.handle(Inbound::upload(OWNER, photo("p1", Some("-f holidays"), Some("album-1")))).await;
    let (dest, notice) = save(&first);
    assert_eq!(dest, pics.join("holidays/pic_p1.jpg"));
    assert!(pics.join("holidays").is_dir());
    assert_eq!(notice.as_deref(), Some("🖼️ Images saved in:\nPictures/holidays"));

    let second = server.handle(Inbound::upload(OWNER, photo("p2", None, Some("album-1")))).await;
    let (dest, notice) = save(&second);
    assert_eq!(dest, pics.join("holidays/pic_p2.jpg"));
    assert_eq!(notice, None);

    // a different album starts over at the root
    let other = server.handle(Inbound::upload(OWNER, photo("p3", None, Some("album-2")))).await;
    let (dest, notice) = save(&other);
    assert_eq!(dest, pics.join("pic_p3.jpg"));
    assert!(notice.is_some());
}

#[tokio::test]
async fn escaping_folder_falls_back_to_area_root() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);

    let (dest, _) = save(&server.handle(Inbound::upload(OWNER, document(Some("cv.pdf"), Some("-f ../../etc"), 10))).await);
    assert_eq!(dest, docs.join("cv.pdf"));
}

#[tokio::test]
async fn dot_captions_cannot_name_the_area_itself() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);

    for caption in ["..", "."] {
        let (dest, _) = save(&server.handle(Inbound::upload(OWNER, document(Some("README"), Some(caption), 10))).await);
        assert_eq!(dest, docs.join("README"), "caption {caption:?}");
    }
}

#[tokio::test]
async fn documents_keep_a_sanitized_original_name() {
    let (_tmp, server) = server().await;
    let docs = base(&server, AreaKind::Documents);

    let (dest, notice) = save(&server.handle(Inbound::upload(OWNER, document(Some("my report:v2.pdf"), None, 10))).await);
    assert_eq!(dest, docs.join("my_report_v2.pdf"));
    assert_eq!(notice.as_deref(), Some("📂 Files saved in:\nDocuments"));

    let (dest, _) = save(&server.handle(Inbound::upload(OWNER, document(None, None, 10))).await);
    assert_eq!(dest, docs.join("doc_AgADdoc"));

    let (dest, _) = save(&server.handle(Inbound::upload(OWNER, document(Some("scan.pdf"), Some("contract"), 10))).await);
    assert_eq!(dest, docs.join("contract.pdf"));
}

#[tokio::test]
async fn oversized_uploads_are_refused() {
    let (_tmp, server) = server().await;
    let replies = server.handle(Inbound::upload(OWNER, document(Some("big.iso"), None, 21 * 1024 * 1024))).await;
    assert_eq!(
        texts(&replies),
        vec!["❌ The file exceeds the bot download limit (20 MB). Compress or split it before sending again."]
    );
}
