/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 卷积节点的单元测试：阶数选择、padding模式解析、输出形状与参数量
 */

use crate::nn::{Conv, Node, NodeError, PaddingMode, PaddingPlan, Value};
use crate::tensor::Tensor;
use crate::{args, assert_err};

use super::{counting_context, seeded_context};

#[test]
fn test_same_padding_keeps_spatial_size() -> Result<(), NodeError> {
    let ctx = seeded_context();
    let mut conv = Conv::new(&ctx, args![16, p = "same"])?;
    let y = conv.forward(&Tensor::normal(0.0, 1.0, &[1, 8, 32, 32]))?;

    assert_eq!(y.shape(), &[1, 16, 32, 32]);
    assert_eq!(conv.num_params()?, 16 * 8 * 3 * 3 + 16);
    // relu 之后不会有负值
    assert!(y.to_vec().iter().all(|&v| v >= 0.0));
    Ok(())
}

#[test]
fn test_half_padding_defaults() -> Result<(), NodeError> {
    let ctx = seeded_context();
    let mut conv = Conv::new(&ctx, args![])?;
    let y = conv.forward(&Tensor::zeros(&[2, 4, 16, 16]))?;

    // 未指定输出通道：half 取 2 * in_channels
    assert_eq!(y.shape(), &[2, 8, 8, 8]);
    let config = conv.core().config();
    assert_eq!(config.get("s"), Some(&Value::Int(2)));
    assert_eq!(config.get("p"), Some(&Value::Int(1)));
    assert_eq!(config.get("d"), Some(&Value::Int(1)));
    assert_eq!(config.get("c"), Some(&Value::Int(8)));
    Ok(())
}

#[test]
fn test_double_padding_upsamples_every_forward() -> Result<(), NodeError> {
    let (ctx, counters) = counting_context();
    let mut conv = Conv::new(&ctx, args![p = "double"])?;

    let x = Tensor::normal(0.0, 1.0, &[1, 8, 8, 8]);
    let first = conv.forward(&x)?;
    let second = conv.forward(&x)?;

    // 未指定输出通道：double 取 in_channels / 2
    assert_eq!(first.shape(), &[1, 4, 16, 16]);
    assert_eq!(first, second);
    assert_eq!(counters.created(), 1);
    assert_eq!(counters.upsampled(), 2);
    assert_eq!(conv.upsample_factor(), Some(2));
    Ok(())
}

#[test]
fn test_double_padding_with_single_channel() -> Result<(), NodeError> {
    let ctx = seeded_context();
    let mut conv = Conv::new(&ctx, args![p = "double"])?;
    let result = conv.forward(&Tensor::zeros(&[1, 1, 4, 4]));
    assert_err!(result, NodeError::Configuration(msg) if msg.contains("输出通道数为0"));
    assert!(!conv.is_built());
    Ok(())
}

#[test]
fn test_conv1d_and_conv3d() -> Result<(), NodeError> {
    let ctx = seeded_context();

    let mut conv1d = Conv::new(&ctx, args![5, p = "same"])?;
    assert_eq!(conv1d.forward(&Tensor::zeros(&[2, 3, 10]))?.shape(), &[2, 5, 10]);
    assert_eq!(conv1d.num_params()?, 5 * 3 * 3 + 5);

    let mut conv3d = Conv::new(&ctx, args![])?;
    assert_eq!(
        conv3d.forward(&Tensor::zeros(&[1, 2, 4, 4, 4]))?.shape(),
        &[1, 4, 2, 2, 2]
    );
    Ok(())
}

#[test]
fn test_unsupported_rank() -> Result<(), NodeError> {
    let ctx = seeded_context();

    let mut conv = Conv::new(&ctx, args![4])?;
    let result = conv.forward(&Tensor::zeros(&[1, 3]));
    assert_err!(result, NodeError::Configuration(msg) if msg.contains("0阶"));

    let result = conv.forward(&Tensor::zeros(&[1, 1, 2, 2, 2, 2]));
    assert_err!(result, NodeError::Configuration(msg) if msg.contains("4阶"));

    let result = conv.forward(&Tensor::zeros(&[3]));
    assert_err!(result, NodeError::Configuration(_));
    assert!(!conv.is_built());
    Ok(())
}

#[test]
fn test_half_rejects_odd_spatial_size() -> Result<(), NodeError> {
    let ctx = seeded_context();
    let mut conv = Conv::new(&ctx, args![8])?;
    let result = conv.forward(&Tensor::zeros(&[1, 3, 15, 16]));
    assert_err!(result, NodeError::Configuration(msg) if msg.contains("整除"));
    Ok(())
}

#[test]
fn test_half_odd_spatial_size_suggests_explicit_padding() -> Result<(), NodeError> {
    let ctx = seeded_context();
    let mut conv = Conv::new(&ctx, args![8])?;
    let result = conv.forward(&Tensor::zeros(&[1, 3, 7, 7]));
    assert_err!(result, NodeError::Configuration(msg) if msg.contains("7") && msg.contains("p=<整数>"));

    // 按提示改用显式padding后即可构建
    let mut conv = Conv::new(&ctx, args![8, p = 1, s = 2])?;
    assert_eq!(conv.forward(&Tensor::zeros(&[1, 3, 7, 7]))?.shape(), &[1, 8, 4, 4]);
    Ok(())
}

#[test]
fn test_symbolic_padding_rejects_even_kernel() {
    let ctx = seeded_context();
    assert_err!(
        Conv::new(&ctx, args![8, k = 4]),
        NodeError::Configuration(msg) if msg.contains("奇数")
    );
    assert_err!(
        Conv::new(&ctx, args![8, k = 2, p = "same"]),
        NodeError::Configuration(msg) if msg.contains("奇数") && msg.contains("p=<整数>")
    );
    // 显式padding不受限制
    assert!(Conv::new(&ctx, args![8, k = 4, p = 0]).is_ok());
}

#[test]
fn test_unknown_padding_mode_and_activation() {
    let ctx = seeded_context();
    assert_err!(
        Conv::new(&ctx, args![8, p = "valid"]),
        NodeError::Configuration("不支持的padding模式`valid`")
    );
    assert_err!(
        Conv::new(&ctx, args![8, act = "gelu"]),
        NodeError::Configuration("未知的激活函数`gelu`")
    );
}

#[test]
fn test_explicit_padding_passes_through() -> Result<(), NodeError> {
    let ctx = seeded_context();

    // None 视为0填充，步长与膨胀保持声明值
    let mut conv = Conv::new(&ctx, args![4, p = None::<i64>])?;
    assert_eq!(conv.forward(&Tensor::zeros(&[1, 2, 5, 5]))?.shape(), &[1, 4, 3, 3]);
    assert_eq!(conv.core().config().get("p"), Some(&Value::None));
    assert_eq!(conv.core().config().get("s"), Some(&Value::Int(1)));
    assert!(conv.padding_plan().is_none());

    let mut conv = Conv::new(&ctx, args![4, k = 5, p = 2, s = 2])?;
    assert_eq!(conv.forward(&Tensor::zeros(&[1, 2, 9, 9]))?.shape(), &[1, 4, 5, 5]);
    Ok(())
}

#[test]
fn test_explicit_padding_requires_out_channels() -> Result<(), NodeError> {
    let ctx = seeded_context();
    let mut conv = Conv::new(&ctx, args![p = 1])?;
    let result = conv.forward(&Tensor::zeros(&[1, 2, 5, 5]));
    assert_err!(result, NodeError::Configuration(msg) if msg.contains("out_channels"));
    Ok(())
}

#[test]
fn test_groups_and_bias() -> Result<(), NodeError> {
    let ctx = seeded_context();
    let mut conv = Conv::new(&ctx, args![4, p = "same", g = 2, b = false])?;
    conv.forward(&Tensor::zeros(&[1, 2, 6, 6]))?;

    let names: Vec<String> = conv.named_parameters()?.into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["weight"]);
    assert_eq!(conv.parameters()?[0].shape(), &[4, 1, 3, 3]);

    let mut bad = Conv::new(&ctx, args![3, p = "same", g = 2])?;
    assert_err!(bad.forward(&Tensor::zeros(&[1, 2, 6, 6])), NodeError::Configuration(_));
    Ok(())
}

#[test]
fn test_wrong_channels_after_build() -> Result<(), NodeError> {
    let ctx = seeded_context();
    let mut conv = Conv::new(&ctx, args![4, p = "same"])?;
    conv.forward(&Tensor::zeros(&[1, 2, 6, 6]))?;
    let result = conv.forward(&Tensor::zeros(&[1, 3, 6, 6]));
    assert_err!(result, NodeError::ShapeMismatch { .. });
    Ok(())
}

#[test]
fn test_padding_plan_resolve() -> Result<(), NodeError> {
    let plan = PaddingPlan::resolve(PaddingMode::Half, 5, None, &[1, 3, 8, 8])?;
    assert_eq!(
        plan,
        Some(PaddingPlan {
            stride: 2,
            padding: 2,
            dilation: 1,
            out_channels: 6,
            upsample: None,
        })
    );

    let plan = PaddingPlan::resolve(PaddingMode::Double, 3, Some(10), &[1, 3, 7])?;
    assert_eq!(plan.map(|p| (p.stride, p.out_channels, p.upsample)), Some((1, 10, Some(2))));

    assert_eq!(PaddingPlan::resolve(PaddingMode::Explicit(1), 3, None, &[1, 3, 7])?, None);
    Ok(())
}

#[test]
fn test_padding_plan_rejects_short_shapes() {
    for shape in [&[][..], &[1][..], &[1, 3][..]] {
        assert_err!(
            PaddingPlan::resolve(PaddingMode::Same, 3, None, shape),
            NodeError::Configuration(msg) if msg.contains("空间维")
        );
    }
    // 显式padding不依赖输入形状
    assert!(matches!(PaddingPlan::resolve(PaddingMode::Explicit(0), 3, None, &[1]), Ok(None)));
}

#[test]
fn test_padding_mode_from_value() -> Result<(), NodeError> {
    assert_eq!(PaddingMode::from_value(&Value::from("half"))?, PaddingMode::Half);
    assert_eq!(PaddingMode::from_value(&Value::None)?, PaddingMode::Explicit(0));
    assert_eq!(PaddingMode::from_value(&Value::from(3))?, PaddingMode::Explicit(3));
    assert_err!(PaddingMode::from_value(&Value::from(-1)), NodeError::Configuration(_));
    assert_eq!(PaddingMode::Half.scale_factor(), Some(0.5));
    assert_eq!(PaddingMode::Explicit(2).scale_factor(), None);
    Ok(())
}
