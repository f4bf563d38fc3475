use arbor::{ContainerBuilder, Inject, Injectable, InstantiatorResult};
use parking_lot::Mutex;
use std::sync::Arc;

struct Memo {
    title: &'static str,
    due_in_days: i64,
}

struct Memos(Vec<Memo>);

trait Writer: Send + Sync {
    fn write_line(&self, line: String);
}

#[derive(Clone, Default)]
struct Console {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Writer for Console {
    fn write_line(&self, line: String) {
        self.lines.lock().push(line);
    }
}

trait MemoDueNotifier: Send + Sync {
    fn memo_is_due(&self, memo: &Memo);
}

struct PrintingNotifier {
    writer: Arc<dyn Writer>,
}

impl MemoDueNotifier for PrintingNotifier {
    fn memo_is_due(&self, memo: &Memo) {
        self.writer.write_line(format!("Memo '{}' is due!", memo.title));
    }
}

impl Injectable for PrintingNotifier {
    type Dependencies = (Inject<dyn Writer>,);

    fn inject((Inject(writer),): Self::Dependencies) -> InstantiatorResult<Self> {
        Ok(Self { writer })
    }
}

struct MemoChecker {
    memos: Arc<Memos>,
    notifier: Arc<dyn MemoDueNotifier>,
}

impl MemoChecker {
    fn check_now(&self) {
        for memo in self.memos.0.iter().filter(|memo| memo.due_in_days < 0) {
            self.notifier.memo_is_due(memo);
        }
    }
}

impl Injectable for MemoChecker {
    type Dependencies = (Inject<Memos>, Inject<dyn MemoDueNotifier>);

    fn inject((Inject(memos), Inject(notifier)): Self::Dependencies) -> InstantiatorResult<Self> {
        Ok(Self { memos, notifier })
    }
}

#[test]
fn test_memo_checker_graph() {
    let console = Console::default();

    let mut builder = ContainerBuilder::new();
    builder.register_type::<MemoChecker>();
    builder
        .register_type::<PrintingNotifier>()
        .as_service(|notifier| notifier as Arc<dyn MemoDueNotifier>);
    builder.register_instance(Memos(vec![
        Memo {
            title: "Lunch",
            due_in_days: -1,
        },
        Memo {
            title: "Dinner",
            due_in_days: 1,
        },
        Memo {
            title: "Breakfast",
            due_in_days: -3,
        },
    ]));
    builder
        .register_instance(console.clone())
        .as_service(|console| console as Arc<dyn Writer>);
    let container = builder.build().unwrap();

    container.resolve::<MemoChecker>().unwrap().check_now();

    assert_eq!(*console.lines.lock(), ["Memo 'Lunch' is due!", "Memo 'Breakfast' is due!"]);

    container.dispose();
    assert_eq!(console.lines.lock().len(), 2);
}

#[test]
fn test_missing_link_reported_with_dependent() {
    let mut builder = ContainerBuilder::new();
    builder.register_type::<MemoChecker>();
    builder.register_instance(Memos(Vec::new()));
    let container = builder.build().unwrap();

    let err = container.resolve::<MemoChecker>().err().unwrap();

    assert!(!err.is_not_registered());
    assert!(err.to_string().contains("MemoChecker"));
}
