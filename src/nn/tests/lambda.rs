/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 任意函数节点的单元测试：命名、无参数构建与前向
 */

use crate::nn::{BuildState, Lambda, Node, NodeError, function_name};
use crate::tensor::Tensor;

use super::seeded_context;

fn halve(x: &Tensor) -> Tensor {
    x.map(|v| v / 2.0)
}

#[test]
fn test_named_after_function() {
    let ctx = seeded_context();
    let node = Lambda::new(&ctx, halve);
    assert_eq!(node.name(), "halve");
    assert_eq!(node.get_args(), "");
}

#[test]
fn test_closure_falls_back_to_lambda() {
    let ctx = seeded_context();
    let node = Lambda::new(&ctx, |x: &Tensor| x.clone());
    assert_eq!(node.name(), "Lambda");

    let pointer: fn(&Tensor) -> Tensor = halve;
    let node = Lambda::new(&ctx, pointer);
    assert_eq!(node.name(), "Lambda");

    let node = Lambda::named(&ctx, "scale", |x: &Tensor| x.map(|v| v * 3.0));
    assert_eq!(node.name(), "scale");
}

#[test]
fn test_function_name() {
    assert_eq!(function_name::<i32>().as_deref(), Some("i32"));
    assert_eq!(function_name::<Tensor>().as_deref(), Some("Tensor"));
    assert_eq!(function_name::<Option<u8>>().as_deref(), Some("Option"));
    assert_eq!(function_name::<&str>(), None);
    assert_eq!(function_name::<dyn Fn(&Tensor) -> Tensor>(), None);
}

#[test]
fn test_forward_builds_without_parameters() -> Result<(), NodeError> {
    let ctx = seeded_context();
    let mut node = Lambda::new(&ctx, halve);
    assert_eq!(node.state(), BuildState::Unbuilt);

    let y = node.forward(&Tensor::new(&[2.0, 4.0], &[1, 2]))?;
    assert_eq!(y.to_vec(), vec![1.0, 2.0]);
    assert_eq!(node.state(), BuildState::Built);
    assert!(node.parameters()?.is_empty());
    assert_eq!(node.num_params()?, 0);
    assert!(node.layer().is_none());
    Ok(())
}
