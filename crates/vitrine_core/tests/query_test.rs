use chrono::TimeDelta;
use vitrine_core::{
    now_millis, Image, ImageFilter, ImageView, ListQuery, OrderBy, Ownership, MAX_PAGE_LIMIT,
};

#[test]
fn builder_works() {
    let query = ListQuery::builder()
        .filter(ImageFilter::Private)
        .page(2)
        .build();

    assert_eq!(*query.filter(), ImageFilter::Private);
    assert_eq!(*query.order_by(), OrderBy::UpdatedTime); // Default
    assert!(!query.ascending()); // Default
    assert_eq!(*query.page(), 2);
    assert_eq!(query.offset(), 10);
}

#[test]
fn validate_rejects_invalid_pagination() {
    let query = ListQuery::builder().page(-1).build();
    assert!(query.validate().is_err());

    let query = ListQuery::builder().limit(MAX_PAGE_LIMIT + 1).build();
    assert!(query.validate().is_err());

    let query = ListQuery::builder().page(1).limit(MAX_PAGE_LIMIT).build();
    assert!(query.validate().is_ok());
}

#[test]
fn validate_rejects_page_past_largest_offset() {
    let query = ListQuery::builder().page(i64::MAX).limit(100).build();
    let err = query.validate().unwrap_err();
    assert!(err.to_string().contains("page"));
    assert_eq!(query.offset(), i64::MAX);

    let last = i64::MAX / 100 + 1;
    let query = ListQuery::builder().page(last).limit(100).build();
    assert!(query.validate().is_ok());
    assert_eq!(query.offset(), (last - 1) * 100);
}

#[test]
fn view_joins_image_and_ownership() {
    let created = now_millis();
    let image = Image {
        image_id: 3,
        content_hash: "ab".repeat(32),
        extension: "png".to_string(),
        created_time: created,
    };
    let ownership = Ownership {
        ownership_id: 9,
        user_id: 4,
        image_id: 3,
        is_private: false,
        created_time: created,
        updated_time: created + TimeDelta::seconds(5),
    };

    let view = ImageView::new(&image, &ownership, "/private/3".into(), None);
    assert_eq!(view.image_hash_name, format!("{}.png", "ab".repeat(32)));
    assert_eq!(view.user_id, 4);
    assert!(!view.is_private);
    assert_eq!(view.updated_time, ownership.updated_time);
}
