/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 激活函数解析与数值的单元测试
 */

use approx::assert_abs_diff_eq;

use crate::assert_err;
use crate::nn::{Activation, LEAKY_RELU_SLOPE, NodeError, Value};
use crate::tensor::Tensor;

#[test]
fn test_from_value() {
    assert_eq!(Activation::from_value(&Value::None).unwrap(), Activation::Identity);
    assert_eq!(Activation::from_value(&Value::from("relu")).unwrap(), Activation::ReLU);
    assert_eq!(Activation::from_value(&Value::from("sigmoid")).unwrap(), Activation::Sigmoid);
    assert_eq!(Activation::from_value(&Value::from("tanh")).unwrap(), Activation::Tanh);
    assert_eq!(Activation::from_value(&Value::from("lrelu")).unwrap(), Activation::LeakyReLU);
    assert_eq!(Activation::from_value(&Value::from("identity")).unwrap(), Activation::Identity);
}

#[test]
fn test_unknown_activation() {
    assert_err!(
        Activation::from_value(&Value::from("swish")),
        NodeError::Configuration("未知的激活函数`swish`")
    );
    assert_err!(Activation::from_value(&Value::from(1)), NodeError::Configuration(_));
}

#[test]
fn test_apply() {
    let x = Tensor::new(&[-2.0, 0.0, 1.5], &[3]);

    assert_eq!(Activation::Identity.apply(&x), x);
    assert_eq!(Activation::ReLU.apply(&x).to_vec(), vec![0.0, 0.0, 1.5]);

    let y = Activation::LeakyReLU.apply(&x).to_vec();
    assert_abs_diff_eq!(y[0], -2.0 * LEAKY_RELU_SLOPE, epsilon = 1e-6);
    assert_abs_diff_eq!(y[2], 1.5, epsilon = 1e-6);

    let y = Activation::Sigmoid.apply(&x).to_vec();
    assert_abs_diff_eq!(y[1], 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(y[0], 0.119_202_92, epsilon = 1e-6);

    let y = Activation::Tanh.apply(&x).to_vec();
    assert_abs_diff_eq!(y[2], 1.5f32.tanh(), epsilon = 1e-6);
}

#[test]
fn test_display_matches_parse() {
    for act in [
        Activation::Identity,
        Activation::ReLU,
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::LeakyReLU,
    ] {
        let parsed = Activation::from_value(&Value::from(act.to_string())).unwrap();
        assert_eq!(parsed, act);
    }
}
