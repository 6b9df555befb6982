//! Integration tests for registering and resolving trait objects.
//!
//! A capability key usually names an interface. Its factory returns an
//! `Arc<dyn Trait>`, which the container stores behind its own `Arc`, so reads come
//! back as `Arc<Arc<dyn Trait>>`.

use autowire::{Arguments, Container, ContainerError, Injectable, Parameter};
use std::sync::Arc;

trait Logger: Send + Sync {
    fn name(&self) -> &str;
}

trait Calculator: Send + Sync {
    fn calculate(&self, a: i32, b: i32) -> i32;
}

impl std::fmt::Debug for dyn Calculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Calculator")
    }
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn name(&self) -> &str {
        "ConsoleLogger"
    }
}

struct AddCalculator;

impl Calculator for AddCalculator {
    fn calculate(&self, a: i32, b: i32) -> i32 {
        a + b
    }
}

struct Report {
    logger: Arc<dyn Logger>,
    calculator: Arc<dyn Calculator>,
}

impl Injectable for Report {
    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::capability("logger", "LoggerInterface"),
            Parameter::capability("calculator", "CalculatorInterface"),
        ]
    }

    fn construct(args: &Arguments) -> Result<Self, ContainerError> {
        let logger: Arc<Arc<dyn Logger>> = args.required(0)?;
        let calculator: Arc<Arc<dyn Calculator>> = args.required(1)?;
        Ok(Report {
            logger: logger.as_ref().clone(),
            calculator: calculator.as_ref().clone(),
        })
    }
}

fn container() -> Container {
    let container = Container::new();
    container
        .register_factory("LoggerInterface", |_| {
            Ok(Arc::new(ConsoleLogger) as Arc<dyn Logger>)
        })
        .unwrap();
    container
        .register_factory("CalculatorInterface", |_| {
            Ok(Arc::new(AddCalculator) as Arc<dyn Calculator>)
        })
        .unwrap();
    container
}

#[test]
fn test_resolve_trait_objects() {
    let container = container();

    let logger: Arc<Arc<dyn Logger>> = container.resolve_as("LoggerInterface").unwrap().unwrap();
    let calc: Arc<Arc<dyn Calculator>> = container
        .resolve_as("CalculatorInterface")
        .unwrap()
        .unwrap();

    assert_eq!(logger.name(), "ConsoleLogger");
    assert_eq!(calc.calculate(40, 2), 42);
}

#[test]
fn test_wrong_trait_is_type_mismatch() {
    let container = container();
    let err = container
        .resolve_as::<Arc<dyn Calculator>>("LoggerInterface")
        .unwrap_err();
    assert!(matches!(
        err,
        ContainerError::TypeMismatch { ref key, .. } if key == "LoggerInterface"
    ));
}

#[test]
fn test_autowire_trait_dependencies() {
    let container = container();
    container.declare_type::<Report>("Report").unwrap();
    container.register_type("Report", "Report").unwrap();

    let report: Arc<Report> = container.resolve_as("Report").unwrap().unwrap();
    let logger: Arc<Arc<dyn Logger>> = container.resolve_as("LoggerInterface").unwrap().unwrap();

    assert_eq!(report.logger.name(), "ConsoleLogger");
    assert_eq!(report.calculator.calculate(20, 22), 42);
    assert!(Arc::ptr_eq(&report.logger, logger.as_ref()));
}

#[test]
fn test_swapping_implementation_per_container() {
    struct FileLogger;
    impl Logger for FileLogger {
        fn name(&self) -> &str {
            "FileLogger"
        }
    }

    let production = container();
    let testing = Container::new();
    testing
        .register_factory("LoggerInterface", |_| {
            Ok(Arc::new(FileLogger) as Arc<dyn Logger>)
        })
        .unwrap();

    let a: Arc<Arc<dyn Logger>> = production.resolve_as("LoggerInterface").unwrap().unwrap();
    let b: Arc<Arc<dyn Logger>> = testing.resolve_as("LoggerInterface").unwrap().unwrap();
    assert_eq!(a.name(), "ConsoleLogger");
    assert_eq!(b.name(), "FileLogger");
}
