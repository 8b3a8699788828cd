//! Article Service Tests

use pretty_assertions::assert_eq;
use uuid::Uuid;

use content_backend::application::dto::{
    AttachmentPayload, CreateArticleDto, DeleteArticleDto, GetArticleDto, ImagePayload,
    ListArticlesDto, UpdateArticleDto,
};
use content_backend::domain::{LinkTable, ReferenceKind};
use content_backend::shared::error::{AppError, ErrorKind};
use content_backend::shared::pagination::ListRequest;

use crate::common::{id, TestBackend};

fn image(url: &str) -> ImagePayload {
    ImagePayload {
        url: Some(url.into()),
        alt_text: Some("cover".into()),
        ..Default::default()
    }
}

fn attachment(file_name: &str) -> AttachmentPayload {
    AttachmentPayload {
        file_name: Some(file_name.into()),
        url: Some(format!("https://cdn.example.com/{}", file_name)),
        content_type: Some("application/pdf".into()),
        size_bytes: Some(2048),
        ..Default::default()
    }
}

async fn create(backend: &TestBackend, request: CreateArticleDto) -> Uuid {
    let created = backend
        .services
        .articles
        .create_article(&backend.ctx, request)
        .await
        .unwrap();
    id(&created)
}

fn get_by_id(article: Uuid) -> GetArticleDto {
    GetArticleDto {
        id: Some(article),
        title: None,
    }
}

#[tokio::test]
async fn test_create_and_get_resolves_every_relation() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let news = backend.category().await;
    let guides = backend.category().await;

    let article = create(
        &backend,
        CreateArticleDto {
            title: "Hello, Rust".into(),
            summary: Some("A short intro".into()),
            content: Some("Body".into()),
            author_id: Some(author),
            image: Some(image("https://cdn.example.com/hello.png")),
            attachment: Some(attachment("hello.pdf")),
            blog_category_ids: vec![news, guides],
            blog_tags: vec!["rust".into(), "intro".into()],
        },
    )
    .await;

    let dto = backend
        .services
        .articles
        .get_article(get_by_id(article))
        .await
        .unwrap();

    assert_eq!(dto.title, "Hello, Rust");
    assert_eq!(dto.audit.version, 1);
    assert_eq!(dto.audit.created, dto.audit.changed);
    assert_eq!(dto.author.id, author.to_string());
    assert_eq!(
        dto.image.as_ref().map(|i| i.url.as_str()),
        Some("https://cdn.example.com/hello.png")
    );
    assert_eq!(
        dto.image.as_ref().and_then(|i| i.extension.as_deref()),
        Some("png")
    );
    assert_eq!(
        dto.attachment.as_ref().and_then(|a| a.size_label.clone()),
        Some("2.0 KB".to_string())
    );
    let categories: Vec<_> = dto.blog_categories.iter().map(|c| c.id.clone()).collect();
    assert_eq!(categories, vec![news.to_string(), guides.to_string()]);
    let tags: Vec<_> = dto.blog_tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["rust", "intro"]);
}

#[tokio::test]
async fn test_create_reuses_existing_tags_and_creates_only_new_ones() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let existing = backend.reference(ReferenceKind::BlogTag, "rust").await;

    let article = create(
        &backend,
        CreateArticleDto {
            title: "Tags".into(),
            author_id: Some(author),
            blog_tags: vec!["rust".into(), " async ".into(), "async".into()],
            ..Default::default()
        },
    )
    .await;

    assert_eq!(backend.references.count(ReferenceKind::BlogTag), 2);
    assert_eq!(backend.references.count_named(ReferenceKind::BlogTag, "async"), 1);

    let linked = backend.articles.links.related(LinkTable::ArticleBlogTags, article);
    assert_eq!(linked.len(), 2);
    assert_eq!(linked[0], existing);
}

#[tokio::test]
async fn test_create_with_missing_category_persists_nothing() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let missing = Uuid::now_v7();

    let err = backend
        .services
        .articles
        .create_article(
            &backend.ctx,
            CreateArticleDto {
                title: "Orphan".into(),
                author_id: Some(author),
                image: Some(image("https://cdn.example.com/orphan.png")),
                blog_category_ids: vec![missing],
                blog_tags: vec!["never-created".into()],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(&err, AppError::NotFound(msg) if msg.contains(&missing.to_string())));
    assert_eq!(err.kind(), ErrorKind::Technical);
    assert_eq!(backend.articles.rows.len(), 0);
    assert_eq!(backend.images.rows.len(), 0);
    assert_eq!(backend.references.count(ReferenceKind::BlogTag), 0);
}

#[tokio::test]
async fn test_create_with_unknown_author_is_not_found() {
    let backend = TestBackend::new();

    let err = backend
        .services
        .articles
        .create_article(
            &backend.ctx,
            CreateArticleDto {
                title: "Nobody wrote this".into(),
                author_id: Some(Uuid::now_v7()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(msg) if msg.starts_with("Author")));
    assert_eq!(backend.articles.rows.len(), 0);
}

#[tokio::test]
async fn test_create_with_blank_title_is_validation() {
    let backend = TestBackend::new();
    let author = backend.author().await;

    let err = backend
        .services
        .articles
        .create_article(
            &backend.ctx,
            CreateArticleDto {
                title: "   ".into(),
                author_id: Some(author),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), 10007);
}

#[tokio::test]
async fn test_failed_persist_is_technical_and_discards_new_sub_resources() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    backend.articles.rows.fail_writes(true);

    let err = backend
        .services
        .articles
        .create_article(
            &backend.ctx,
            CreateArticleDto {
                title: "Doomed".into(),
                author_id: Some(author),
                image: Some(image("https://cdn.example.com/doomed.png")),
                attachment: Some(attachment("doomed.pdf")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Technical);
    assert_eq!(backend.articles.rows.len(), 0);
    assert_eq!(backend.images.rows.len(), 0);
    assert_eq!(backend.attachments.rows.len(), 0);
}

#[tokio::test]
async fn test_get_prefers_id_and_falls_back_to_title() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let first = create(
        &backend,
        CreateArticleDto {
            title: "First".into(),
            author_id: Some(author),
            ..Default::default()
        },
    )
    .await;
    create(
        &backend,
        CreateArticleDto {
            title: "Second".into(),
            author_id: Some(author),
            ..Default::default()
        },
    )
    .await;

    let articles = &backend.services.articles;
    let by_both = articles
        .get_article(GetArticleDto {
            id: Some(first),
            title: Some("Second".into()),
        })
        .await
        .unwrap();
    let by_title = articles
        .get_article(GetArticleDto {
            id: None,
            title: Some("Second".into()),
        })
        .await
        .unwrap();
    let neither = articles.get_article(GetArticleDto::default()).await;

    assert_eq!(by_both.title, "First");
    assert_eq!(by_title.title, "Second");
    assert!(matches!(neither, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_update_applies_category_diff_and_keeps_omitted_fields() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let (a, b, c) = (
        backend.category().await,
        backend.category().await,
        backend.category().await,
    );
    let article = create(
        &backend,
        CreateArticleDto {
            title: "Diff".into(),
            summary: Some("keep me".into()),
            author_id: Some(author),
            blog_category_ids: vec![a, b],
            blog_tags: vec!["rust".into()],
            ..Default::default()
        },
    )
    .await;

    backend
        .services
        .articles
        .update_article(
            &backend.ctx,
            UpdateArticleDto {
                id: Some(article),
                expected_version: Some(1),
                title: Some("Diff, revised".into()),
                blog_category_ids: Some(vec![b, c]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let stored = backend.articles.rows.get(article).unwrap();
    assert_eq!(stored.title, "Diff, revised");
    assert_eq!(stored.summary.as_deref(), Some("keep me"));
    assert_eq!(stored.audit.version, 2);

    let mut categories = backend
        .articles
        .links
        .related(LinkTable::ArticleBlogCategories, article);
    categories.sort();
    let mut expected = vec![b, c];
    expected.sort();
    assert_eq!(categories, expected);
    assert_eq!(
        backend
            .articles
            .links
            .related(LinkTable::ArticleBlogTags, article)
            .len(),
        1
    );
}

#[tokio::test]
async fn test_update_replaces_tags_creating_new_names_first() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let article = create(
        &backend,
        CreateArticleDto {
            title: "Tags".into(),
            author_id: Some(author),
            blog_tags: vec!["rust".into(), "old".into()],
            ..Default::default()
        },
    )
    .await;

    backend
        .services
        .articles
        .update_article(
            &backend.ctx,
            UpdateArticleDto {
                id: Some(article),
                blog_tags: Some(vec!["rust".into(), "new".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let dto = backend
        .services
        .articles
        .get_article(get_by_id(article))
        .await
        .unwrap();
    let mut tags: Vec<_> = dto.blog_tags.iter().map(|t| t.name.clone()).collect();
    tags.sort();
    assert_eq!(tags, vec!["new".to_string(), "rust".into()]);
    // The unlinked tag survives as a reference entity.
    assert_eq!(backend.references.count_named(ReferenceKind::BlogTag, "old"), 1);
}

#[tokio::test]
async fn test_update_with_new_image_deletes_superseded_one() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let article = create(
        &backend,
        CreateArticleDto {
            title: "Covers".into(),
            author_id: Some(author),
            image: Some(image("https://cdn.example.com/v1.png")),
            ..Default::default()
        },
    )
    .await;
    let original = backend.articles.rows.get(article).unwrap().image_id.unwrap();

    backend
        .services
        .articles
        .update_article(
            &backend.ctx,
            UpdateArticleDto {
                id: Some(article),
                image: Some(image("https://cdn.example.com/v2.png")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let replacement = backend.articles.rows.get(article).unwrap().image_id.unwrap();
    assert_ne!(replacement, original);
    assert!(backend.images.rows.get(original).is_none());
    assert_eq!(
        backend.images.rows.get(replacement).unwrap().url,
        "https://cdn.example.com/v2.png"
    );
}

#[tokio::test]
async fn test_update_with_image_id_updates_in_place() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let article = create(
        &backend,
        CreateArticleDto {
            title: "Covers".into(),
            author_id: Some(author),
            image: Some(image("https://cdn.example.com/v1.png")),
            ..Default::default()
        },
    )
    .await;
    let image_id = backend.articles.rows.get(article).unwrap().image_id.unwrap();

    backend
        .services
        .articles
        .update_article(
            &backend.ctx,
            UpdateArticleDto {
                id: Some(article),
                image: Some(ImagePayload {
                    id: Some(image_id),
                    alt_text: Some("sunset".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(backend.articles.rows.get(article).unwrap().image_id, Some(image_id));
    let stored = backend.images.rows.get(image_id).unwrap();
    assert_eq!(stored.alt_text.as_deref(), Some("sunset"));
    assert_eq!(stored.url, "https://cdn.example.com/v1.png");
    assert_eq!(stored.audit.version, 2);
    assert_eq!(backend.images.rows.len(), 1);
}

#[tokio::test]
async fn test_concurrent_updates_from_same_version_conflict() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let article = create(
        &backend,
        CreateArticleDto {
            title: "Race".into(),
            author_id: Some(author),
            ..Default::default()
        },
    )
    .await;
    let update = |title: &str| UpdateArticleDto {
        id: Some(article),
        expected_version: Some(1),
        title: Some(title.into()),
        ..Default::default()
    };

    let articles = &backend.services.articles;
    articles
        .update_article(&backend.ctx, update("Winner"))
        .await
        .unwrap();
    let err = articles
        .update_article(&backend.ctx, update("Loser"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.code(), 10005);
    let stored = backend.articles.rows.get(article).unwrap();
    assert_eq!(stored.title, "Winner");
    assert_eq!(stored.audit.version, 2);
}

#[tokio::test]
async fn test_update_unknown_article_is_not_found() {
    let backend = TestBackend::new();

    let err = backend
        .services
        .articles
        .update_article(
            &backend.ctx,
            UpdateArticleDto {
                id: Some(Uuid::now_v7()),
                title: Some("Ghost".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_clearing_fields_leaves_links_and_sub_resources() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let category = backend.category().await;
    let article = create(
        &backend,
        CreateArticleDto {
            title: "Clear".into(),
            summary: Some("summary".into()),
            content: Some("content".into()),
            author_id: Some(author),
            image: Some(image("https://cdn.example.com/clear.png")),
            blog_category_ids: vec![category],
            blog_tags: vec!["rust".into()],
            ..Default::default()
        },
    )
    .await;
    let image_id = backend.articles.rows.get(article).unwrap().image_id.unwrap();

    let deleted = backend
        .services
        .articles
        .delete_article(
            &backend.ctx,
            DeleteArticleDto {
                id: Some(article),
                fields_to_delete: vec!["summary".into(), "image_id".into()],
            },
        )
        .await
        .unwrap();

    assert!(deleted);
    let stored = backend.articles.rows.get(article).unwrap();
    assert!(stored.summary.is_none());
    assert!(stored.image_id.is_none());
    assert_eq!(stored.content.as_deref(), Some("content"));
    assert_eq!(stored.audit.version, 2);
    assert!(backend.images.rows.get(image_id).is_some());
    assert_eq!(
        backend
            .articles
            .links
            .related(LinkTable::ArticleBlogCategories, article),
        vec![category]
    );
}

#[tokio::test]
async fn test_clearing_required_field_is_validation() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let article = create(
        &backend,
        CreateArticleDto {
            title: "Keep title".into(),
            author_id: Some(author),
            ..Default::default()
        },
    )
    .await;

    for field in ["title", "author_id", "password"] {
        let err = backend
            .services
            .articles
            .delete_article(
                &backend.ctx,
                DeleteArticleDto {
                    id: Some(article),
                    fields_to_delete: vec![field.into()],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "field {}", field);
    }
    assert_eq!(backend.articles.rows.get(article).unwrap().audit.version, 1);
}

#[tokio::test]
async fn test_full_delete_removes_links_and_owned_resources() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let category = backend.category().await;
    let article = create(
        &backend,
        CreateArticleDto {
            title: "Gone".into(),
            author_id: Some(author),
            image: Some(image("https://cdn.example.com/gone.png")),
            attachment: Some(attachment("gone.pdf")),
            blog_category_ids: vec![category],
            blog_tags: vec!["rust".into()],
            ..Default::default()
        },
    )
    .await;

    let deleted = backend
        .services
        .articles
        .delete_article(
            &backend.ctx,
            DeleteArticleDto {
                id: Some(article),
                fields_to_delete: Vec::new(),
            },
        )
        .await
        .unwrap();

    assert!(deleted);
    let err = backend
        .services
        .articles
        .get_article(get_by_id(article))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(backend.images.rows.len(), 0);
    assert_eq!(backend.attachments.rows.len(), 0);
    assert!(backend
        .articles
        .links
        .find(LinkTable::ArticleBlogCategories, &[article])
        .is_empty());
    assert!(backend
        .articles
        .links
        .find(LinkTable::ArticleBlogTags, &[article])
        .is_empty());
    // Linked reference entities are not owned.
    assert_eq!(backend.references.count(ReferenceKind::BlogTag), 1);
    assert!(backend.references.rows.get(category).is_some());
}

#[tokio::test]
async fn test_list_filters_by_author_and_resolves_relations() {
    let backend = TestBackend::new();
    let ada = backend.author().await;
    let grace = backend.author().await;
    let category = backend.category().await;

    for title in ["b", "a", "c"] {
        create(
            &backend,
            CreateArticleDto {
                title: title.into(),
                author_id: Some(ada),
                blog_category_ids: vec![category],
                blog_tags: vec!["shared".into()],
                ..Default::default()
            },
        )
        .await;
    }
    create(
        &backend,
        CreateArticleDto {
            title: "other".into(),
            author_id: Some(grace),
            ..Default::default()
        },
    )
    .await;

    let page = backend
        .services
        .articles
        .list_articles(ListArticlesDto {
            page: ListRequest::new(2, 0).sorted_by("title", "asc"),
            author_id: Some(ada),
        })
        .await
        .unwrap();

    let titles: Vec<_> = page.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b"]);
    for article in &page {
        assert_eq!(article.author.id, ada.to_string());
        assert_eq!(article.blog_categories.len(), 1);
        assert_eq!(article.blog_tags[0].name, "shared");
    }
}

#[tokio::test]
async fn test_list_with_zero_limit_is_validation() {
    let backend = TestBackend::new();

    let err = backend
        .services
        .articles
        .list_articles(ListArticlesDto {
            page: ListRequest::new(0, 0),
            author_id: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_create_with_overlong_tag_writes_no_tags() {
    let backend = TestBackend::new();
    let author = backend.author().await;

    let err = backend
        .services
        .articles
        .create_article(
            &backend.ctx,
            CreateArticleDto {
                title: "Too long".into(),
                author_id: Some(author),
                blog_tags: vec!["fresh-tag".into(), "x".repeat(201)],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.references.count(ReferenceKind::BlogTag), 0);
    assert_eq!(backend.articles.rows.len(), 0);
}

#[tokio::test]
async fn test_update_with_overlong_tag_leaves_article_untouched() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let article = create(
        &backend,
        CreateArticleDto {
            title: "Stable".into(),
            author_id: Some(author),
            blog_tags: vec!["rust".into()],
            ..Default::default()
        },
    )
    .await;

    let err = backend
        .services
        .articles
        .update_article(
            &backend.ctx,
            UpdateArticleDto {
                id: Some(article),
                blog_tags: Some(vec!["fresh-tag".into(), "x".repeat(201)]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.references.count(ReferenceKind::BlogTag), 1);
    assert_eq!(backend.articles.rows.get(article).unwrap().audit.version, 1);
}

#[tokio::test]
async fn test_failed_attachment_create_discards_new_image() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    backend.attachments.rows.fail_writes(true);

    let err = backend
        .services
        .articles
        .create_article(
            &backend.ctx,
            CreateArticleDto {
                title: "Half built".into(),
                author_id: Some(author),
                image: Some(image("https://cdn.example.com/half.png")),
                attachment: Some(attachment("half.pdf")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Technical);
    assert_eq!(backend.articles.rows.len(), 0);
    assert_eq!(backend.images.rows.len(), 0);
    assert_eq!(backend.attachments.rows.len(), 0);
}

#[tokio::test]
async fn test_failed_attachment_on_update_discards_new_image() {
    let backend = TestBackend::new();
    let author = backend.author().await;
    let article = create(
        &backend,
        CreateArticleDto {
            title: "Bare".into(),
            author_id: Some(author),
            ..Default::default()
        },
    )
    .await;
    backend.attachments.rows.fail_writes(true);

    let err = backend
        .services
        .articles
        .update_article(
            &backend.ctx,
            UpdateArticleDto {
                id: Some(article),
                image: Some(image("https://cdn.example.com/new.png")),
                attachment: Some(attachment("new.pdf")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Technical);
    assert_eq!(backend.images.rows.len(), 0);
    let stored = backend.articles.rows.get(article).unwrap();
    assert!(stored.image_id.is_none());
    assert_eq!(stored.audit.version, 1);
}
