use crate::workflows::intake::domain::{
    validate_upload, DocumentSlot, TagSelection, UploadKind, UploadRejection, UploadedFile,
    DEFAULT_TAGS,
};
use crate::workflows::verification::DocumentCategory;

#[test]
fn slots_map_onto_verification_categories() {
    assert_eq!(
        DocumentSlot::BankStatements.category(),
        DocumentCategory::BankStatement
    );
    assert_eq!(DocumentSlot::TaxReturns.category(), DocumentCategory::IncomeTax);
    assert_eq!(
        "addressProof".parse::<DocumentSlot>(),
        Ok(DocumentSlot::AddressProof)
    );
    assert!("bankStatement".parse::<DocumentSlot>().is_err());
}

#[test]
fn documents_over_five_megabytes_are_rejected() {
    let file = UploadedFile::new(
        "scan.pdf",
        "application/pdf",
        vec![0_u8; UploadKind::Document.max_bytes() + 1],
    );

    let err = validate_upload(&file, UploadKind::Document).expect_err("too large");
    assert_eq!(err, UploadRejection::DocumentTooLarge);
    assert_eq!(err.to_string(), "File size should be less than 5MB");
}

#[test]
fn document_at_exact_limit_is_accepted() {
    let file = UploadedFile::new(
        "scan.pdf",
        "application/pdf",
        vec![0_u8; UploadKind::Document.max_bytes()],
    );

    assert_eq!(validate_upload(&file, UploadKind::Document), Ok(()));
}

#[test]
fn content_type_parameters_and_case_are_ignored() {
    let file = UploadedFile::new("scan.png", "IMAGE/PNG; charset=binary", vec![1, 2, 3]);
    assert_eq!(validate_upload(&file, UploadKind::Document), Ok(()));
}

#[test]
fn unsupported_types_are_rejected_per_kind() {
    let doc = UploadedFile::new("notes.txt", "text/plain", vec![1]);
    assert_eq!(
        validate_upload(&doc, UploadKind::Document),
        Err(UploadRejection::UnsupportedDocumentType)
    );

    let video = UploadedFile::new("pitch.avi", "video/x-msvideo", vec![1]);
    let err = validate_upload(&video, UploadKind::Video).expect_err("avi refused");
    assert_eq!(err.to_string(), "Only MP4 and MOV formats are allowed");

    let mov = UploadedFile::new("pitch.mov", "video/quicktime", vec![1]);
    assert_eq!(validate_upload(&mov, UploadKind::Video), Ok(()));
}

#[test]
fn oversized_video_is_rejected() {
    let video = UploadedFile::new(
        "pitch.mp4",
        "video/mp4",
        vec![0_u8; UploadKind::Video.max_bytes() + 1],
    );
    assert_eq!(
        validate_upload(&video, UploadKind::Video),
        Err(UploadRejection::VideoTooLarge)
    );
}

#[test]
fn tag_selection_starts_with_the_default_catalog() {
    let tags = TagSelection::default();
    assert_eq!(tags.available().len(), DEFAULT_TAGS.len());
    assert_eq!(tags.available()[0], "Technology");
    assert!(tags.selected().is_empty());
}

#[test]
fn custom_tags_join_the_catalog_once() {
    let mut tags = TagSelection::default();
    assert!(tags.select("  Fintech "));
    assert!(!tags.select("Fintech"));
    assert!(!tags.select("   "));

    assert_eq!(tags.selected(), ["Fintech".to_string()]);
    assert_eq!(tags.available().last().map(String::as_str), Some("Fintech"));
    assert_eq!(tags.available().len(), DEFAULT_TAGS.len() + 1);
}

#[test]
fn replacing_the_selection_keeps_first_seen_order() {
    let mut tags = TagSelection::default();
    tags.select("Recycling");
    tags.replace_selection(["Healthcare", "Education", "Healthcare"]);

    assert_eq!(
        tags.selected(),
        ["Healthcare".to_string(), "Education".to_string()]
    );
    assert!(tags.deselect("Healthcare"));
    assert!(!tags.deselect("Healthcare"));
    assert_eq!(tags.selected(), ["Education".to_string()]);
}
