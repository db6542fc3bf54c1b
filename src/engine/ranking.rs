// ==========================================
// 码头堆存费用 KPI 系统 - 排名工具
// ==========================================
// 排名规则: 升序，数值相同名次相同，
// 下一个不同数值的名次 = 其在排序后序列中的位置（从 1 起）
// 例: [1, 2, 2, 5] → 名次 [1, 2, 2, 4]
// ==========================================

/// 计算 value 在池中的名次（升序，并列同名次）
///
/// # 返回
/// - Some(rank): value 在池中
/// - None: value 不在池中
pub fn competition_rank(pool: &[f64], value: f64) -> Option<usize> {
    if !pool.iter().any(|v| *v == value) {
        return None;
    }
    Some(pool.iter().filter(|v| **v < value).count() + 1)
}

/// 线性名次得分
///
/// score = best − (rank − 1) × (best / 2) / (N − 1)
/// - N == 1 → best
/// - N == 0 → best / 2
pub fn linear_rank_score(rank: usize, pool_size: usize, best: f64) -> f64 {
    match pool_size {
        0 => best / 2.0,
        1 => best,
        n => best - (rank.saturating_sub(1)) as f64 * (best / 2.0) / (n - 1) as f64,
    }
}

/// 单箱费用名次得分表（第 11 名起为 0）
const COST_RANK_SCORES: [f64; 10] = [25.0, 22.5, 20.0, 17.5, 15.0, 12.5, 10.0, 7.5, 5.0, 2.5];

/// 单箱费用名次 → 得分（rank 为 0 表示未参与排名）
pub fn cost_rank_score(rank: usize) -> f64 {
    if rank == 0 {
        return 0.0;
    }
    COST_RANK_SCORES.get(rank - 1).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_competition_rank_ties() {
        let pool = [5.0, 1.0, 2.0, 2.0];
        assert_eq!(competition_rank(&pool, 1.0), Some(1));
        assert_eq!(competition_rank(&pool, 2.0), Some(2));
        assert_eq!(competition_rank(&pool, 5.0), Some(4));
        assert_eq!(competition_rank(&pool, 3.0), None);
    }

    #[test]
    fn test_linear_rank_score_bounds() {
        assert_eq!(linear_rank_score(1, 1, 35.0), 35.0);
        assert_eq!(linear_rank_score(1, 0, 35.0), 17.5);
        assert_eq!(linear_rank_score(1, 3, 35.0), 35.0);
        assert_eq!(linear_rank_score(2, 3, 35.0), 26.25);
        assert_eq!(linear_rank_score(3, 3, 35.0), 17.5);
        assert_eq!(linear_rank_score(3, 3, 25.0), 12.5);
    }

    #[test]
    fn test_cost_rank_table() {
        assert_eq!(cost_rank_score(1), 25.0);
        assert_eq!(cost_rank_score(10), 2.5);
        assert_eq!(cost_rank_score(11), 0.0);
        assert_eq!(cost_rank_score(0), 0.0);
    }
}
