use mondo::{doc, models, DocumentManager, Entity, ObjectId, Ref};
use mondo_driver_memory::MemoryDriver;

#[derive(Default, Entity)]
struct Client {
    #[key]
    id: ObjectId,
    #[field("Name")]
    name: String,
    #[field("Projects")]
    #[odm("referenceMany(targetDocument:Project)")]
    projects: Vec<Ref<Project>>,
}

#[derive(Default, Entity)]
struct Employee {
    #[key]
    id: ObjectId,
    #[field("Name")]
    name: String,
    // never stored; resolved by querying projects whose employee points here
    #[odm("referenceMany(targetDocument:Project,mappedBy:employee)")]
    projects: Vec<Ref<Project>>,
}

#[derive(Default, Entity)]
struct Project {
    #[key]
    id: ObjectId,
    #[field("Title")]
    title: String,
    #[field("Employee")]
    #[odm("referenceOne(targetDocument:Employee)")]
    employee: Option<Ref<Employee>>,
    #[odm("referenceOne(targetDocument:Client,mappedBy:projects)")]
    client: Option<Ref<Client>>,
}

fn session(driver: &MemoryDriver) -> DocumentManager {
    let mut manager = DocumentManager::new(driver.clone());
    manager
        .register_many(&models![Employee, Project, Client])
        .unwrap();
    manager
}

fn persist_graph(manager: &mut DocumentManager) -> Ref<Employee> {
    let employee = Ref::new(Employee {
        name: "John".into(),
        ..Default::default()
    });
    let project1 = Ref::new(Project {
        title: "First project".into(),
        employee: Some(employee.clone()),
        ..Default::default()
    });
    let project2 = Ref::new(Project {
        title: "Second project".into(),
        employee: Some(employee.clone()),
        ..Default::default()
    });
    let client1 = Ref::new(Client {
        name: "Example".into(),
        projects: vec![project1.clone(), project2.clone()],
        ..Default::default()
    });
    let client2 = Ref::new(Client {
        name: "Acme".into(),
        ..Default::default()
    });

    manager.persist(&employee).unwrap();
    manager.persist(&project1).unwrap();
    manager.persist(&project2).unwrap();
    manager.persist(&client1).unwrap();
    manager.persist(&client2).unwrap();
    manager.flush().unwrap();
    employee
}

#[test]
fn inverse_sides_resolve_through_the_owning_collection() {
    let driver = MemoryDriver::new();
    let mut manager = session(&driver);
    let employee = persist_graph(&mut manager);

    let found = manager.find_one::<Employee>(doc! { "Name": "John" }).unwrap();
    assert!(Ref::ptr_eq(&found, &employee));

    let projects = found.borrow().projects.clone();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].borrow().title, "First project");
    assert_eq!(projects[1].borrow().title, "Second project");

    // the owning side resolves back to the very same employee
    let back = projects[0].borrow().employee.clone().unwrap();
    assert!(Ref::ptr_eq(&back, &found));

    // the inverse referenceOne picks the first owning document
    let client = projects[0].borrow().client.clone().unwrap();
    assert_eq!(client.borrow().name, "Example");
    let client = projects[1].borrow().client.clone().unwrap();
    assert_eq!(client.borrow().name, "Example");
}

#[test]
fn inverse_sides_resolve_in_a_fresh_session_too() {
    let driver = MemoryDriver::new();
    persist_graph(&mut session(&driver));

    let mut manager = session(&driver);
    let found = manager.find_one::<Employee>(doc! { "Name": "John" }).unwrap();

    let projects = found.borrow().projects.clone();
    assert_eq!(projects.len(), 2);
    let back = projects[0].borrow().employee.clone().unwrap();
    assert!(Ref::ptr_eq(&back, &found));
    let client = projects[1].borrow().client.clone().unwrap();
    assert_eq!(client.borrow().name, "Example");

    // a client that owns no projects resolves nothing
    let acme = manager.find_one::<Client>(doc! { "Name": "Acme" }).unwrap();
    assert!(acme.borrow().projects.is_empty());
}

#[test]
fn inverse_fields_are_never_stored() {
    let driver = MemoryDriver::new();
    let mut manager = session(&driver);
    let employee = persist_graph(&mut manager);

    // read the raw employee document through a plain driver query
    use mondo::driver::Driver;
    use mondo::Value;
    let mut filter = mondo::Document::new();
    filter.insert("_id", Value::ObjectId(employee.borrow().id));
    let raw = driver
        .collection("Employee")
        .find_one(&filter)
        .unwrap()
        .unwrap();
    assert!(raw.get("projects").is_none());
    assert_eq!(raw.get("Name").and_then(Value::as_str), Some("John"));
}
