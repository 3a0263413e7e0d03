use attrex::{normalize_attrs, resolve, Attr, AttrSpec, Fields, Rule, Value};

#[derive(Debug, Clone)]
struct Org {
  name: String,
  email: Option<String>,
}

impl Fields for Org {
  fn field(&self, name: &str) -> Option<Value> {
    match name {
      "name" => Some(self.name.as_str().into()),
      "email" => Some(self.email.clone().into()),
      _ => None,
    }
  }

  fn field_names(&self) -> Vec<&'static str> {
    vec!["name", "email"]
  }
}

#[derive(Debug, Clone)]
struct Listing {
  title: String,
  org: Option<Org>,
}

impl Fields for Listing {
  fn field(&self, name: &str) -> Option<Value> {
    match name {
      "title" => Some(self.title.as_str().into()),
      "org" => Some(self.org.clone().map(Value::record).into()),
      _ => None,
    }
  }

  fn field_names(&self) -> Vec<&'static str> {
    vec!["title", "org"]
  }
}

fn listing() -> Listing {
  Listing {
    title: "Support".to_string(),
    org: Some(Org {
      name: "Acme".to_string(),
      email: Some("info@acme.nl".to_string()),
    }),
  }
}

#[test]
fn single_segment_resolves_field() {
  let obj = listing();
  match resolve(&obj, "title") {
    Value::Str(s) => assert_eq!(s, "Support"),
    other => panic!("expected string, got {other:?}"),
  }
}

#[test]
fn missing_attribute_yields_absent_not_error() {
  let obj = listing();
  assert!(matches!(resolve(&obj, "nope"), Value::Null));
}

#[test]
fn dotted_path_walks_nested_records() {
  let obj = listing();
  match resolve(&obj, "org.email") {
    Value::Str(s) => assert_eq!(s, "info@acme.nl"),
    other => panic!("expected string, got {other:?}"),
  }
}

#[test]
fn absent_intermediate_short_circuits_to_absent() {
  let obj = Listing {
    title: "Support".to_string(),
    org: None,
  };
  assert!(matches!(resolve(&obj, "org.email"), Value::Null));
  assert!(matches!(resolve(&obj, "org.email.deeper"), Value::Null));
}

#[test]
fn scalar_intermediate_yields_absent() {
  let obj = listing();
  assert!(matches!(resolve(&obj, "title.length"), Value::Null));
}

#[test]
fn missing_nested_attribute_yields_absent() {
  let obj = listing();
  assert!(matches!(resolve(&obj, "org.phone"), Value::Null));
}

#[test]
fn bare_path_spec_uses_path_as_label() {
  let specs = normalize_attrs(&[AttrSpec::from("org.email")]);
  assert_eq!(specs.len(), 1);
  assert_eq!(specs[0].label, "org.email");
  match &specs[0].rule {
    Rule::Paths(paths) => assert_eq!(paths, &vec![(0usize, "org.email".to_string())]),
    other => panic!("expected path rule, got {other:?}"),
  }
}

#[test]
fn normalization_preserves_input_order() {
  let attrs: Vec<AttrSpec> = vec![
    ("B", "title").into(),
    "org.name".into(),
    ("A", vec!["title", "org.name"]).into(),
  ];
  let labels: Vec<String> = normalize_attrs(&attrs).into_iter().map(|s| s.label).collect();
  assert_eq!(labels, vec!["B", "org.name", "A"]);
}

#[test]
fn labeled_many_paths_default_to_primary_object() {
  let specs = normalize_attrs(&[("Combined", vec!["title", "org.name"]).into()]);
  match &specs[0].rule {
    Rule::Paths(paths) => assert_eq!(
      paths,
      &vec![(0usize, "title".to_string()), (0usize, "org.name".to_string())]
    ),
    other => panic!("expected path rule, got {other:?}"),
  }
}

#[test]
fn labeled_indexed_paths_keep_their_indices() {
  let specs = normalize_attrs(&[("Combined", vec![(2usize, "title"), (0usize, "org.name")]).into()]);
  match &specs[0].rule {
    Rule::Paths(paths) => assert_eq!(
      paths,
      &vec![(2usize, "title".to_string()), (0usize, "org.name".to_string())]
    ),
    other => panic!("expected path rule, got {other:?}"),
  }
}

#[test]
fn builder_infers_label_from_last_segment_of_first_path() {
  let spec = Attr::from_path("org.email").normalize();
  assert_eq!(spec.label, "email");
}

#[test]
fn builder_without_paths_normalizes_to_empty_path_list() {
  let specs = normalize_attrs(&[Attr::new("X").into()]);
  assert_eq!(specs[0].label, "X");
  match &specs[0].rule {
    Rule::Paths(paths) => assert!(paths.is_empty()),
    other => panic!("expected path rule, got {other:?}"),
  }
}

#[test]
fn any_fallback_call_makes_the_whole_spec_a_chain() {
  let spec = Attr::new("Email")
    .path("email")
    .fallback("org.email")
    .path("org.name")
    .normalize();
  match &spec.rule {
    Rule::Fallback(paths) => assert_eq!(paths.len(), 3),
    other => panic!("expected fallback rule, got {other:?}"),
  }
}

#[test]
fn transform_wins_over_accumulated_paths() {
  let spec = Attr::new("Link")
    .path("title")
    .transform(|_| Some(Value::Str("fixed".to_string())))
    .normalize();
  assert!(matches!(spec.rule, Rule::Transform(_)));
}

#[test]
fn builder_normalize_is_idempotent() {
  let attr = Attr::new("Email").path("email").fallback("org.email");
  let first = attr.normalize();
  let second = attr.normalize();
  assert_eq!(first.label, second.label);
  match (&first.rule, &second.rule) {
    (Rule::Fallback(a), Rule::Fallback(b)) => assert_eq!(a, b),
    other => panic!("expected matching fallback rules, got {other:?}"),
  }
}
