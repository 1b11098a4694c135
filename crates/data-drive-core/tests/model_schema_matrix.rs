use std::cell::{Cell, RefCell};
use std::rc::Rc;

use data_drive_core::{
    Change, DataError, Listener, Notification, Observable, Property, Reactive, ScalarOptions,
    ScalarType, Schema, Type, TypeRef, Value,
};
use serde_json::{json, Value as JsonValue};

type Seen = Rc<RefCell<Vec<Notification>>>;

fn record<O: Observable<Notification>>(source: &O) -> (Listener<Notification>, Seen) {
    let seen: Seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let listener = Listener::new(move |n: &Notification| sink.borrow_mut().push(n.clone()));
    listener.listen(source);
    (listener, seen)
}

fn user_schema() -> Schema {
    Schema::builder()
        .scalar("name")
        .scalar("role")
        .list("emails", TypeRef::Scalar)
        .build()
}

fn team_schema() -> Schema {
    Schema::builder()
        .scalar("name")
        .list("members", user_schema())
        .build()
}

fn update_vals(n: &Notification) -> (Option<JsonValue>, Option<JsonValue>) {
    match &n.change {
        Change::Update { old_val, new_val, .. } => (old_val.clone(), new_val.clone()),
        other => panic!("expected an update, got {other:?}"),
    }
}

#[test]
fn scalar_update_carries_old_and_new() {
    let v = data_drive_core::create_value(None).unwrap();
    let (_listener, seen) = record(&v);

    v.set_value(json!(5432)).unwrap();
    v.set_value(json!(2345)).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].kind(), "update");
    assert_eq!(update_vals(&seen[0]), (Some(JsonValue::Null), Some(json!(5432))));
    assert_eq!(update_vals(&seen[1]), (Some(json!(5432)), Some(json!(2345))));
    assert_eq!(v.value(), json!(2345));
}

#[test]
fn scalar_type_options_matrix() {
    let cases = [
        (json!({"initialVal": 3542}), json!(3542), JsonValue::Null),
        (json!({"defaultVal": "someVal"}), json!("someVal"), json!("someVal")),
        (
            json!({"defaultVal": "someVal", "initialVal": "otherVal"}),
            json!("otherVal"),
            json!("someVal"),
        ),
    ];
    for (options, initial, after_null) in cases {
        let options: ScalarOptions = serde_json::from_value(options).unwrap();
        let v = ScalarType::with_options(options).create_value().unwrap();
        assert_eq!(v.value(), initial);
        v.set_value(json!(1234)).unwrap();
        assert_eq!(v.value(), json!(1234));
        v.set_value(JsonValue::Null).unwrap();
        assert_eq!(v.value(), after_null);
    }
}

#[test]
fn schema_defines_model_properties() {
    let m = user_schema().create_model().unwrap();
    let name = m.query("name").unwrap();
    let emails = m.query("emails").unwrap();
    assert_eq!(name.kind(), "scalar");
    assert_eq!(emails.kind(), "list");

    let (_name_listener, name_seen) = record(&name);
    m.set_property("name", json!("DD")).unwrap();
    assert_eq!(m.get("name"), Some(json!("DD")));
    assert_eq!(
        update_vals(&name_seen.borrow()[0]),
        (Some(JsonValue::Null), Some(json!("DD")))
    );

    let (_emails_listener, emails_seen) = record(&emails);
    m.set_property("emails", json!(["test@dd"])).unwrap();
    assert_eq!(
        update_vals(&emails_seen.borrow()[0]),
        (Some(json!([])), Some(json!(["test@dd"])))
    );
    let Some(Property::List(list)) = m.get_property("emails") else {
        panic!("emails should be a list");
    };
    assert_eq!(list.len(), 1);
    assert_eq!(list.val_at(0), Some(json!("test@dd")));
    assert_eq!(m.get_property("name").map(Property::into_json), Some(json!("DD")));
}

#[test]
fn nested_schemas_fill_missing_properties() {
    let m = team_schema().create_model().unwrap();
    m.set_property(
        "members",
        json!([
            {"name": "Jacky", "role": "Leader", "emails": ["jacky@DD"]},
            {"name": "Christ"}
        ]),
    )
    .unwrap();

    let members = m.list("members").unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(
        members.val_at(0),
        Some(json!({"name": "Jacky", "role": "Leader", "emails": ["jacky@DD"]}))
    );
    assert_eq!(
        members.val_at(1),
        Some(json!({"name": "Christ", "role": null, "emails": []}))
    );
}

#[test]
fn model_value_keeps_declaration_order() {
    let m = user_schema().create_model().unwrap();
    m.set_property("emails", json!(["hudson@dd"])).unwrap();
    m.set_property("role", json!("Writer")).unwrap();
    m.set_property("name", json!("Hudson")).unwrap();

    let value = m.value();
    assert_eq!(
        value,
        json!({"name": "Hudson", "role": "Writer", "emails": ["hudson@dd"]})
    );
    assert_eq!(
        serde_json::to_string(&value).unwrap(),
        r#"{"name":"Hudson","role":"Writer","emails":["hudson@dd"]}"#
    );
    assert_eq!(m.property_names(), vec!["name", "role", "emails"]);
}

#[test]
fn model_set_value_round_trips_and_rejects_non_objects() {
    let m = user_schema().create_model().unwrap();
    let data = json!({"name": "a", "role": "b", "emails": ["c"]});
    m.set_value(data.clone()).unwrap();
    assert_eq!(m.value(), data);
    m.set_value(m.value()).unwrap();
    assert_eq!(m.value(), data);

    assert!(matches!(m.set_value(json!("x")), Err(DataError::TypeKind(_))));
    assert!(matches!(m.set_value(json!([1])), Err(DataError::TypeKind(_))));
}

fn members_fixture() -> data_drive_core::Model {
    let m = team_schema().create_model().unwrap();
    m.set_property(
        "members",
        json!([
            {"name": "Jacky", "role": "Leader", "emails": ["jacky@DD"]},
            {"name": "Christ", "role": "Chef"}
        ]),
    )
    .unwrap();
    m
}

#[test]
fn query_resolves_nested_paths() {
    let m = members_fixture();
    assert_eq!(m.query("members.1.role").map(|v| v.value()), Some(json!("Chef")));
    assert_eq!(
        m.query("members.0.emails.0").map(|v| v.value()),
        Some(json!("jacky@DD"))
    );
    assert!(m.query("members..1").is_some());
    assert!(m.query("").unwrap().ptr_eq(&m.to_value()));
    assert!(m.query("members.2").is_none());
    assert!(m.query("members.01x").is_none());
    assert!(m.query_names(&["members", "1", "name"]).is_some());
}

#[test]
fn query_with_reports_unresolved_remainder() {
    let m = members_fixture();
    let members = m.find_property("members").unwrap();
    let direct = |value: &Value, left: Option<&[String]>| {
        (value.clone(), left.map(<[String]>::to_vec))
    };

    let (value, left) = m.query_with("members.100.role", direct);
    assert!(value.ptr_eq(&members));
    assert_eq!(left, Some(vec!["100".to_string(), "role".to_string()]));

    let (value, left) = m.query_with("nonexists.role", direct);
    assert!(value.ptr_eq(&m.to_value()));
    assert_eq!(left, Some(vec!["nonexists".to_string(), "role".to_string()]));

    let (value, left) = m.query_with("members.1.role.x", direct);
    let role = m
        .list("members")
        .and_then(|l| l.at(1))
        .and_then(|member| member.find_property("role"))
        .unwrap();
    assert!(value.ptr_eq(&role));
    assert_eq!(value.value(), json!("Chef"));
    assert_eq!(left, Some(vec!["x".to_string()]));

    let (value, left) = m.query_with("members.1", direct);
    assert_eq!(value.kind(), "model");
    assert_eq!(left, None);
}

#[test]
fn mapped_names_apply_to_whole_value_only() {
    let schema = Schema::builder()
        .scalar("id")
        .scalar("title")
        .mapping("id", "_id")
        .build();
    let m = schema.create_model().unwrap();

    m.set_value(json!({"_id": 7, "id": 1, "title": "t"})).unwrap();
    assert_eq!(m.get("id"), Some(json!(7)));
    assert_eq!(m.value(), json!({"_id": 7, "title": "t"}));
    assert!(m.query("id").is_some());
    assert!(m.query("_id").is_none());
    assert_eq!(m.map_name("id"), "_id");
}

#[test]
fn set_property_emits_property_change_on_model_only() {
    let m = user_schema().create_model().unwrap();
    let (_listener, seen) = record(&m);

    m.set_property("name", json!("x")).unwrap();
    m.scalar("role").unwrap().set_value(json!("direct")).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kind(), "property");
    match &seen[0].change {
        Change::Property { name, value } => {
            assert_eq!(name, "name");
            assert_eq!(value, &json!("x"));
        }
        other => panic!("expected a property change, got {other:?}"),
    }
    assert!(seen[0].data.ptr_eq(&m.to_value()));
}

#[test]
fn schema_fields_accept_configured_types() {
    let schema = Schema::builder()
        .field(
            "status",
            ScalarType::with_options(ScalarOptions {
                default_val: Some(json!("new")),
                ..ScalarOptions::default()
            }),
        )
        .build();
    let m = schema.create_model().unwrap();
    assert_eq!(m.value(), json!({"status": "new"}));
}

#[test]
fn caching_follows_revision() {
    let v = data_drive_core::create_value(None).unwrap();
    v.set_caching(true);
    assert!(v.is_caching());

    let before = v.revision();
    assert_eq!(v.value(), JsonValue::Null);
    v.set_value(json!(1)).unwrap();
    assert_eq!(v.revision(), before + 1);
    assert_eq!(v.value(), json!(1));
    assert_eq!(v.value(), json!(1));
    assert_eq!(v.revision(), before + 1);

    v.set_caching(false);
    v.set_value(json!(2)).unwrap();
    assert_eq!(v.value(), json!(2));
    assert_eq!(v.revision(), before + 2);
}

#[test]
fn listeners_read_fresh_values_during_dispatch() {
    let v = data_drive_core::create_value(None).unwrap();
    v.set_caching(true);
    assert_eq!(v.value(), JsonValue::Null);

    let read = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&read);
    let listener = Listener::new(move |n: &Notification| sink.borrow_mut().push(n.data.value()));
    listener.listen(&v);

    v.set_value(json!("fresh")).unwrap();
    assert_eq!(*read.borrow(), vec![json!("fresh")]);
}

#[test]
fn listener_may_mutate_its_source() {
    let v = data_drive_core::create_value(None).unwrap();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let listener = Listener::new(move |n: &Notification| {
        counter.set(counter.get() + 1);
        if n.data.get_val() == json!(1) {
            n.data.set_value(json!(2)).unwrap();
        }
    });
    listener.listen(&v);

    v.set_value(json!(1)).unwrap();

    assert_eq!(calls.get(), 2);
    assert_eq!(v.value(), json!(2));
    assert_eq!(v.revision(), 2);
}

#[test]
fn refresh_notifies_without_touching_revision() {
    let m = user_schema().create_model().unwrap();
    let (_listener, seen) = record(&m);
    let rev = m.revision();

    m.refresh();

    assert_eq!(m.revision(), rev);
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].change.is_refresh());
    assert_eq!(update_vals(&seen[0]), (None, None));
}

#[test]
fn unknown_property_is_an_error() {
    let m = user_schema().create_model().unwrap();
    assert_eq!(
        m.set_property("age", json!(3)),
        Err(DataError::UnknownProperty("age".to_string()))
    );
    assert!(m.get_property("age").is_none());
}
