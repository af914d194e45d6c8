use super::*;
use crate::lang;
use std::path::Path;

fn units_for(file: &str, source: &str) -> Vec<SourceUnit> {
    extract_units(source, lang::detect(Path::new(file)).unwrap())
}

#[test]
fn rust_free_function() {
    let units = units_for(
        "a.rs",
        "fn add(a: u32, b: u32) -> u32 {\n    a + b\n}\n",
    );
    assert_eq!(units.len(), 1);
    let u = &units[0];
    assert_eq!(u.kind, UnitKind::Function);
    assert_eq!(u.name.as_deref(), Some("add"));
    assert_eq!(u.param_count, 2);
    assert!(u.returns_value);
    assert_eq!((u.start_line, u.end_line), (1, 3));
}

#[test]
fn rust_impl_method_with_attr() {
    let source = "\
struct Svc;

impl Svc {
    #[inline]
    fn handle(&self) -> bool {
        true
    }
}
";
    let units = units_for("a.rs", source);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].kind, UnitKind::Method);
    assert_eq!(units[0].decorators, vec!["inline".to_string()]);
}

#[test]
fn rust_trait_declaration_without_body_skipped() {
    let units = units_for("a.rs", "trait T {\n    fn describe(&self) -> String;\n}\n");
    assert!(units.is_empty());
}

#[test]
fn rust_tuple_return_type() {
    let units = units_for("a.rs", "fn pair() -> (u32, u32) {\n    (1, 2)\n}\n");
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name.as_deref(), Some("pair"));
}

#[test]
fn go_receiver_method() {
    let source = "\
func (s *Server) Handle(w Writer, r *Request) {
    s.log(r)
    w.write(200)
}
";
    let units = units_for("a.go", source);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].kind, UnitKind::Method);
    assert_eq!(units[0].name.as_deref(), Some("Handle"));
    assert_eq!(units[0].param_count, 2);
}

#[test]
fn python_function_and_method() {
    let source = "\
def helper(x):
    return x * 2

class Service:
    def run(self, job):
        out = helper(job)
        return out
";
    let units = units_for("a.py", source);
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].name.as_deref(), Some("helper"));
    assert_eq!(units[0].kind, UnitKind::Function);
    assert_eq!((units[0].start_line, units[0].end_line), (1, 2));
    assert_eq!(units[1].name.as_deref(), Some("run"));
    assert_eq!(units[1].kind, UnitKind::Method);
    assert_eq!((units[1].start_line, units[1].end_line), (5, 7));
}

#[test]
fn python_decorator_captured() {
    let source = "\
@app.route('/users')
def list_users():
    return db.query()
";
    let units = units_for("a.py", source);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].decorators, vec!["app.route".to_string()]);
    assert!(units[0].returns_value);
}

#[test]
fn python_body_ends_at_dedent() {
    let source = "\
def first():
    a = 1
    b = 2

def second():
    return 3
";
    let units = units_for("a.py", source);
    assert_eq!(units.len(), 2);
    assert_eq!((units[0].start_line, units[0].end_line), (1, 3));
    assert_eq!((units[1].start_line, units[1].end_line), (5, 6));
}

#[test]
fn java_bare_method_with_annotation() {
    let source = "\
class Controller {
    @Override
    public String render(Model model) {
        return view.apply(model);
    }
}
";
    let units = units_for("A.java", source);
    assert_eq!(units.len(), 1);
    let u = &units[0];
    assert_eq!(u.kind, UnitKind::Method);
    assert_eq!(u.name.as_deref(), Some("render"));
    assert_eq!(u.decorators, vec!["Override".to_string()]);
    assert!(u.returns_value);
}

#[test]
fn c_function_void_does_not_return_value() {
    let units = units_for("a.c", "void reset(int *p) {\n    *p = 0;\n}\n");
    assert_eq!(units.len(), 1);
    assert!(!units[0].returns_value);
}

#[test]
fn control_blocks_are_not_units() {
    let source = "\
int main(void) {
    if (x) {
        y();
    }
    while (z) {
        w();
    }
    return 0;
}
";
    let units = units_for("a.c", source);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name.as_deref(), Some("main"));
}

#[test]
fn call_statements_are_not_units() {
    let source = "\
class App {
    run() {
        setup(config);
        this.start(now);
    }
}
";
    let units = units_for("a.js", source);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name.as_deref(), Some("run"));
}

#[test]
fn jsx_component_has_markup() {
    let source = "\
function UserCard(props) {
    return <Card title={props.name}>
        <Avatar src={props.avatar} />
    </Card>;
}
";
    let units = units_for("a.jsx", source);
    assert_eq!(units.len(), 1);
    assert!(units[0].has_markup);
    assert!(units[0].returns_value);
}

#[test]
fn nested_functions_emitted_separately() {
    let source = "\
function outer() {
    function inner(a) {
        return a;
    }
    return inner(1);
}
";
    let units = units_for("a.js", source);
    assert_eq!(units.len(), 2);
    let names: Vec<_> = units.iter().filter_map(|u| u.name.as_deref()).collect();
    assert!(names.contains(&"outer"));
    assert!(names.contains(&"inner"));
}

#[test]
fn empty_source_yields_no_units() {
    assert!(units_for("a.rs", "").is_empty());
    assert!(units_for("a.py", "# only a comment\n").is_empty());
}
