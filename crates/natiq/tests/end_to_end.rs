//! The six literal scenarios from spec.md §8, each a direct
//! input-to-stdout (or input-to-diagnostic) assertion.

use natiq::Engine;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

#[derive(Clone)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn run_capturing(source: &str) -> Result<String, natiq::Error> {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let mut engine = Engine::with_output(Box::new(SharedBuffer(buffer.clone())));
    let result = engine.run_source(source);
    let output = String::from_utf8(buffer.borrow().clone()).unwrap();
    result.map(|()| output)
}

#[test]
fn scenario_1_variable_and_arithmetic() {
    let output = run_capturing("متغير س = 10\nاطبع_سطر(س * 2)").unwrap();
    assert_eq!(output, "20\n");
}

#[test]
fn scenario_2_for_over_range() {
    let output = run_capturing("لكل ع في 3 { اطبع_سطر(ع) }").unwrap();
    assert_eq!(output, "0\n1\n2\n");
}

#[test]
fn scenario_3_function_call() {
    let output = run_capturing("دالة مربع(ن) { ارجع ن * ن }\nاطبع_سطر(مربع(7))").unwrap();
    assert_eq!(output, "49\n");
}

#[test]
fn scenario_4_list_indexing() {
    let output = run_capturing("متغير ق = [1, 2, 3]\nاطبع_سطر(ق[1])").unwrap();
    assert_eq!(output, "2\n");
}

#[test]
fn scenario_5_const_reassignment_errors() {
    let err = run_capturing("ثابت ط = 3.14\nط = 3").unwrap_err();
    assert_eq!(err.to_string(), "cannot modify constant: ط at line 2, column 1");
}

#[test]
fn scenario_6_division_by_zero_errors() {
    let err = run_capturing("اطبع_سطر(10 / 0)").unwrap_err();
    assert!(err.to_string().starts_with("division by zero"));
}
