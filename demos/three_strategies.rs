//! Three ways to keep a type down to one instance.
//!
//! Demonstrates:
//! - Call interception with `Enrolled`
//! - Factory wrapping with `SingletonFactory`
//! - Allocation interception with `InstanceSlot`
//!
//! Run with: `cargo run --example three_strategies`
//! Set `RUST_LOG=instance_registry=debug` to see construction logs.

use instance_registry::{ConstructToken, Enrolled, InstanceSlot, SingletonFactory};
use std::convert::Infallible;
use std::sync::Arc;

// -------------------------------------------------------------------------
// 1. Call interception
// -------------------------------------------------------------------------

mod intercepted {
    use super::*;

    pub struct Singleton {
        pub value: Option<String>,
    }

    impl Singleton {
        fn new() -> Self {
            println!("Singleton instance created!");
            Singleton { value: None }
        }

        pub fn do_something(&self) {
            println!("Singleton is doing something!");
        }
    }

    impl Enrolled for Singleton {
        type Args = ();
        type Error = Infallible;

        fn construct(_: (), _: ConstructToken) -> Result<Self, Infallible> {
            Ok(Singleton::new())
        }
    }
}

// -------------------------------------------------------------------------
// 2. Factory wrapping
// -------------------------------------------------------------------------

struct SingletonFactoryDemo {
    value: Option<String>,
}

impl SingletonFactoryDemo {
    fn new(_: ()) -> Self {
        println!("SingletonFactoryDemo instance created!");
        SingletonFactoryDemo { value: None }
    }

    fn do_something(&self) {
        println!("SingletonFactoryDemo is doing something!");
    }
}

static FACTORY_DEMO: SingletonFactory<SingletonFactoryDemo> =
    SingletonFactory::new(SingletonFactoryDemo::new);

// -------------------------------------------------------------------------
// 3. Allocation interception
// -------------------------------------------------------------------------

struct SingletonSlot;

impl SingletonSlot {
    fn instance() -> Arc<SingletonSlot> {
        static SLOT: InstanceSlot<SingletonSlot> = InstanceSlot::new();
        SLOT.get_or_init(|| {
            println!("SingletonSlot instance created!");
            SingletonSlot
        })
    }

    fn do_something(&self) {
        println!("SingletonSlot is doing something!");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Testing Call Interception ===");
    let s1 = intercepted::Singleton::instance(()).expect("construction is infallible");
    let s2 = intercepted::Singleton::instance(()).expect("construction is infallible");
    println!("Are both instances the same? {}", Arc::ptr_eq(&s1, &s2));
    s1.do_something();
    assert!(s1.value.is_none());

    println!("\n=== Testing Factory Wrapping ===");
    let sf1 = FACTORY_DEMO.get(());
    let sf2 = FACTORY_DEMO.get(());
    println!("Are both instances the same? {}", Arc::ptr_eq(&sf1, &sf2));
    sf1.do_something();
    assert!(sf2.value.is_none());

    println!("\n=== Testing Allocation Interception ===");
    let sn1 = SingletonSlot::instance();
    let sn2 = SingletonSlot::instance();
    println!("Are both instances the same? {}", Arc::ptr_eq(&sn1, &sn2));
    sn1.do_something();
}
