// ==========================================
// 码头堆存费用 KPI 系统 - 船公司/起运港名称标准化
// ==========================================
// 查找时忽略首尾空白与大小写；未登记的名称原样返回（去除首尾空白）
// ==========================================

use std::collections::HashMap;
use std::sync::LazyLock;

/// 船公司别名 → 标准名
pub static SHIPPING_LINE_NAMES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();
        m.insert("HAPAG LLOYD", "HAPAG LLOYD");
        m.insert("HAPAG", "HAPAG LLOYD");
        m.insert("ONE", "ONE");
        m.insert("CMA", "CMA");
        m.insert("EVERGREEN", "EVERGREEN");
        m
    });

/// 起运港别名 → 标准代码
pub static ORIGIN_NAMES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("COREA", "KRPUS");
    m.insert("KRSHG", "KRPUS");
    m.insert("SHANGHAI", "CNSHA");
    m.insert("VIETNAM", "VNHPH");
    m
});

fn standardize(map: &HashMap<&'static str, &'static str>, name: &str) -> String {
    let trimmed = name.trim();
    map.get(trimmed.to_uppercase().as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

pub fn standardize_shipping_line(name: &str) -> String {
    standardize(&SHIPPING_LINE_NAMES, name)
}

pub fn standardize_origin(name: &str) -> String {
    standardize(&ORIGIN_NAMES, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_line() {
        assert_eq!(standardize_shipping_line("HAPAG"), "HAPAG LLOYD");
        assert_eq!(standardize_shipping_line(" hapag lloyd "), "HAPAG LLOYD");
        assert_eq!(standardize_shipping_line("MSC "), "MSC");
        assert_eq!(standardize_shipping_line(""), "");
    }

    #[test]
    fn test_origin() {
        assert_eq!(standardize_origin("COREA "), "KRPUS");
        assert_eq!(standardize_origin("KRSHG"), "KRPUS");
        assert_eq!(standardize_origin("SHANGHAI"), "CNSHA");
        assert_eq!(standardize_origin("VIETNAM"), "VNHPH");
        assert_eq!(standardize_origin("CNNGB"), "CNNGB");
    }
}
