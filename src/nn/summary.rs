/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 模型摘要的文本渲染：控制台用的 Unicode 表格与 Markdown 表格
 */

use std::fmt;

use super::descriptor::ModelDescriptor;

const HEADERS: [&str; 5] = ["节点名称", "类型", "输出形状", "参数量", "参数"];

impl ModelDescriptor {
    /// 返回模型摘要字符串（Markdown 格式）
    pub fn summary_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# 模型摘要（输入形状 {:?}）\n\n", self.input_shape));
        output.push_str(&format!("| {} |\n", HEADERS.join(" | ")));
        output.push_str("|----------|------|----------|--------|------|\n");

        for row in self.rows() {
            output.push_str(&format!("| {} |\n", row.join(" | ")));
        }

        output.push_str(&format!(
            "\n**总参数量**: {}\n",
            format_number(self.total_params())
        ));
        output
    }

    /// 返回模型摘要字符串（Unicode 文本表格，用于控制台输出）
    pub fn summary_string(&self) -> String {
        let rows = self.rows();
        let mut widths = HEADERS.map(display_width);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(display_width(cell));
            }
        }
        // 每列左右各留1格空白，再加列间边框
        let total_width = widths.iter().map(|w| w + 2).sum::<usize>() + widths.len() - 1;

        let rule = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("{left}{}{right}\n", segments.join(mid))
        };
        let line = |cells: &[String], right_align_params: bool| {
            let padded: Vec<String> = cells
                .iter()
                .zip(widths)
                .enumerate()
                .map(|(col, (cell, width))| {
                    let fill = " ".repeat(width - display_width(cell));
                    if right_align_params && col == 3 {
                        format!(" {fill}{cell} ")
                    } else {
                        format!(" {cell}{fill} ")
                    }
                })
                .collect();
            format!("│{}│\n", padded.join("│"))
        };

        let mut output = String::new();
        output.push_str(&rule("┌", "┬", "┐"));
        output.push_str(&line(&HEADERS.map(str::to_string), false));
        output.push_str(&rule("├", "┼", "┤"));
        for row in &rows {
            output.push_str(&line(row, true));
        }
        output.push_str(&rule("├", "┴", "┤"));

        let total = format!("总参数量: {}", format_number(self.total_params()));
        let fill = " ".repeat((total_width - 2).saturating_sub(display_width(&total)));
        output.push_str(&format!("│ {total}{fill} │\n"));
        output.push_str(&format!("└{}┘\n", "─".repeat(total_width)));
        output
    }

    fn rows(&self) -> Vec<[String; 5]> {
        self.nodes
            .iter()
            .map(|node| {
                [
                    node.name.clone(),
                    node.kind.clone(),
                    format!("{:?}", node.output_shape),
                    node.param_count
                        .map_or_else(|| "-".to_string(), format_number),
                    node.args.clone(),
                ]
            })
            .collect()
    }
}

impl fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary_string())
    }
}

/// 格式化数字为千分位分隔形式
pub(crate) fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// 计算字符串的显示宽度（中文字符占2个宽度）
fn display_width(s: &str) -> usize {
    s.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}
