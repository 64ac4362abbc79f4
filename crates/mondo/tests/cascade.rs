use mondo::{doc, models, DocumentManager, Entity, ObjectId, Ref};
use mondo_driver_memory::MemoryDriver;

#[derive(Default, Entity, Debug)]
struct Author {
    #[key]
    id: ObjectId,
    #[field("Name")]
    name: String,
    // loading an author also fetches the articles referencing it
    #[odm("referenceMany(targetDocument:Article,mappedBy:author)")]
    articles: Vec<Ref<Article>>,
}

#[derive(Default, Entity, Debug)]
struct Tag {
    #[key]
    id: ObjectId,
    #[field("Name")]
    name: String,
    #[odm("referenceMany(targetDocument:Article,mappedBy:tags)")]
    articles: Vec<Ref<Article>>,
}

#[derive(Default, Entity, Debug)]
struct Article {
    #[key]
    id: ObjectId,
    #[field("Title")]
    title: String,
    #[odm("referenceOne(targetDocument:Author)")]
    author: Option<Ref<Author>>,
    // tags ride along on both persist and remove
    #[odm("referenceMany(targetDocument:Tag,cascade:all)")]
    tags: Vec<Ref<Tag>>,
}

fn session(driver: &MemoryDriver) -> DocumentManager {
    let mut manager = DocumentManager::new(driver.clone());
    manager
        .register_many(&models![Article, Author, Tag])
        .unwrap();
    manager
}

/// Persists two articles; tags are only reachable through the articles'
/// persist cascade.
fn publish(manager: &mut DocumentManager) -> (Ref<Author>, Ref<Tag>) {
    let author = Ref::new(Author {
        name: "John Doe".into(),
        ..Default::default()
    });
    let programming = Ref::new(Tag {
        name: "programming".into(),
        ..Default::default()
    });
    let article1 = Ref::new(Article {
        title: "Go tiger!".into(),
        author: Some(author.clone()),
        tags: vec![
            Ref::new(Tag {
                name: "go".into(),
                ..Default::default()
            }),
            programming.clone(),
        ],
        ..Default::default()
    });
    let article2 = Ref::new(Article {
        title: "MongoDB".into(),
        author: Some(author.clone()),
        tags: vec![programming.clone()],
        ..Default::default()
    });

    manager.persist(&author).unwrap();
    manager.persist(&article1).unwrap();
    manager.persist(&article2).unwrap();
    manager.flush().unwrap();
    (author, programming)
}

#[test]
fn persist_cascades_through_a_many_relationship() {
    let driver = MemoryDriver::new();
    let mut manager = session(&driver);
    let (_, programming) = publish(&mut manager);

    // tags were persisted without an explicit call
    assert_eq!(driver.len("Tag"), 2);
    assert!(!programming.borrow().id.is_zero());

    let author = manager
        .find_one::<Author>(doc! { "Name": "John Doe" })
        .unwrap();
    assert_eq!(author.borrow().articles.len(), 2);

    // shared tag resolves to one in-memory entity across both articles
    let tag = manager
        .find_one::<Tag>(doc! { "Name": "programming" })
        .unwrap();
    assert!(Ref::ptr_eq(&tag, &programming));
    assert_eq!(tag.borrow().articles.len(), 2);
}

#[test]
fn remove_cascades_to_a_shared_tag() {
    let driver = MemoryDriver::new();
    let mut manager = session(&driver);
    publish(&mut manager);

    let articles = manager
        .find_by::<Article>(doc! { "Title": "MongoDB" })
        .unwrap();
    assert_eq!(articles.len(), 1);

    manager.remove(&articles[0]).unwrap();
    manager.flush().unwrap();

    // no reference counting: the tag goes away even though the other
    // article still lists it
    let err = manager
        .find_one::<Tag>(doc! { "Name": "programming" })
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(driver.len("Article"), 1);
}

#[test]
fn dangling_references_hydrate_as_absent() {
    let driver = MemoryDriver::new();
    {
        let mut manager = session(&driver);
        publish(&mut manager);
        let articles = manager
            .find_by::<Article>(doc! { "Title": "MongoDB" })
            .unwrap();
        manager.remove(&articles[0]).unwrap();
        manager.flush().unwrap();
    }

    // a fresh session loads the surviving article; the deleted tag is
    // silently dropped from the list, stored order kept for the rest
    let mut manager = session(&driver);
    let article = manager
        .find_one::<Article>(doc! { "Title": "Go tiger!" })
        .unwrap();
    assert_eq!(article.borrow().tags.len(), 1);
    assert_eq!(article.borrow().tags[0].borrow().name, "go");
    assert!(article.borrow().author.is_some());
}

#[test]
fn dangling_reference_one_hydrates_as_none() {
    let driver = MemoryDriver::new();
    let mut manager = session(&driver);
    let (author, _) = publish(&mut manager);
    manager.remove(&author).unwrap();
    manager.flush().unwrap();

    let mut manager = session(&driver);
    let article = manager
        .find_one::<Article>(doc! { "Title": "Go tiger!" })
        .unwrap();
    assert!(article.borrow().author.is_none());
}

#[test]
fn identity_map_deduplicates_across_loads() {
    let driver = MemoryDriver::new();
    publish(&mut session(&driver));

    let mut manager = session(&driver);
    let articles = manager.find_all::<Article>().unwrap();
    assert_eq!(articles.len(), 2);

    // both articles resolve the author to the same in-memory entity
    let first = articles[0].borrow().author.clone().unwrap();
    let second = articles[1].borrow().author.clone().unwrap();
    assert!(Ref::ptr_eq(&first, &second));

    // and loading the author directly yields that same entity again
    let author = manager
        .find_one::<Author>(doc! { "Name": "John Doe" })
        .unwrap();
    assert!(Ref::ptr_eq(&author, &first));
}
