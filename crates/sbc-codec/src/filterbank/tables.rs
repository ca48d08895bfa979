//! 原型滤波器与余弦调制矩阵.
//!
//! 原型窗已包含每 2M 个系数一次的符号交替, 分析端直接使用.
//! 合成端窗口为 `-M · C`, 与分析端合起来得到单位增益.
//! 定点表在首次使用时生成, 之后只读共享.

use std::f64::consts::PI;
use std::sync::OnceLock;

/// 窗口系数定点精度
pub(crate) const WINDOW_FRAC_BITS: u32 = 20;
/// 余弦矩阵定点精度
pub(crate) const COS_FRAC_BITS: u32 = 14;

/// 4 子带原型窗 (40 点)
#[rustfmt::skip]
const PROTO_4_40: [f64; 40] = [
    0.0, 5.36548976E-04, 1.49188357E-03, 2.73370904E-03,
    3.83720193E-03, 3.89205149E-03, 1.86581691E-03, -3.06012286E-03,
    1.09137620E-02, 2.04385087E-02, 2.88757392E-02, 3.21939290E-02,
    2.58767811E-02, 6.13245186E-03, -2.88217274E-02, -7.76463494E-02,
    1.35593274E-01, 1.94987841E-01, 2.46636662E-01, 2.81828203E-01,
    2.94315332E-01, 2.81828203E-01, 2.46636662E-01, 1.94987841E-01,
    -1.35593274E-01, -7.76463494E-02, -2.88217274E-02, 6.13245186E-03,
    2.58767811E-02, 3.21939290E-02, 2.88757392E-02, 2.04385087E-02,
    -1.09137620E-02, -3.06012286E-03, 1.86581691E-03, 3.89205149E-03,
    3.83720193E-03, 2.73370904E-03, 1.49188357E-03, 5.36548976E-04,
];

/// 8 子带原型窗 (80 点)
#[rustfmt::skip]
const PROTO_8_80: [f64; 80] = [
    0.0, 1.56575398E-04, 3.43256425E-04, 5.54620202E-04,
    8.23919506E-04, 1.13992507E-03, 1.47640169E-03, 1.78371725E-03,
    2.01182542E-03, 2.10371989E-03, 1.99454554E-03, 1.61656283E-03,
    9.02154502E-04, -1.78805361E-04, -1.64973098E-03, -3.49717454E-03,
    5.65949473E-03, 8.02941163E-03, 1.04584443E-02, 1.27472335E-02,
    1.46525263E-02, 1.59045603E-02, 1.62208471E-02, 1.53184106E-02,
    1.29371806E-02, 8.85757540E-03, 2.92408442E-03, -4.91578024E-03,
    -1.46404076E-02, -2.61098752E-02, -3.90751381E-02, -5.31873032E-02,
    6.79989431E-02, 8.29847578E-02, 9.75753918E-02, 1.11196689E-01,
    1.23264548E-01, 1.33264415E-01, 1.40753505E-01, 1.45389847E-01,
    1.46955068E-01, 1.45389847E-01, 1.40753505E-01, 1.33264415E-01,
    1.23264548E-01, 1.11196689E-01, 9.75753918E-02, 8.29847578E-02,
    -6.79989431E-02, -5.31873032E-02, -3.90751381E-02, -2.61098752E-02,
    -1.46404076E-02, -4.91578024E-03, 2.92408442E-03, 8.85757540E-03,
    1.29371806E-02, 1.53184106E-02, 1.62208471E-02, 1.59045603E-02,
    1.46525263E-02, 1.27472335E-02, 1.04584443E-02, 8.02941163E-03,
    -5.65949473E-03, -3.49717454E-03, -1.64973098E-03, -1.78805361E-04,
    9.02154502E-04, 1.61656283E-03, 1.99454554E-03, 2.10371989E-03,
    2.01182542E-03, 1.78371725E-03, 1.47640169E-03, 1.13992507E-03,
    8.23919506E-04, 5.54620202E-04, 3.43256425E-04, 1.56575398E-04,
];

/// 某一子带数下的全部定点表
pub(crate) struct FilterTables {
    /// 分析窗 C (10M 点, Q20)
    pub analysis_window: Vec<i32>,
    /// 合成窗 D = -M · C (10M 点, Q20)
    pub synthesis_window: Vec<i32>,
    /// 分析矩阵 `[k * 2M + i] = cos((k + 0.5)(i - M/2)π/M)` (Q14)
    pub analysis_matrix: Vec<i32>,
    /// 合成矩阵 `[k * M + i] = cos((i + 0.5)(k + M/2)π/M)` (Q14)
    pub synthesis_matrix: Vec<i32>,
}

fn to_fixed(value: f64, frac_bits: u32) -> i32 {
    (value * f64::from(1u32 << frac_bits)).round() as i32
}

impl FilterTables {
    fn build(proto: &[f64]) -> Self {
        let m = proto.len() / 10;
        let mf = m as f64;

        let analysis_window = proto.iter().map(|&c| to_fixed(c, WINDOW_FRAC_BITS)).collect();
        let synthesis_window = proto
            .iter()
            .map(|&c| to_fixed(-mf * c, WINDOW_FRAC_BITS))
            .collect();

        let mut analysis_matrix = Vec::with_capacity(2 * m * m);
        for k in 0..m {
            for i in 0..2 * m {
                let phase = (k as f64 + 0.5) * (i as f64 - mf / 2.0) * PI / mf;
                analysis_matrix.push(to_fixed(phase.cos(), COS_FRAC_BITS));
            }
        }

        let mut synthesis_matrix = Vec::with_capacity(2 * m * m);
        for k in 0..2 * m {
            for i in 0..m {
                let phase = (i as f64 + 0.5) * (k as f64 + mf / 2.0) * PI / mf;
                synthesis_matrix.push(to_fixed(phase.cos(), COS_FRAC_BITS));
            }
        }

        Self {
            analysis_window,
            synthesis_window,
            analysis_matrix,
            synthesis_matrix,
        }
    }
}

static TABLES_4: OnceLock<FilterTables> = OnceLock::new();
static TABLES_8: OnceLock<FilterTables> = OnceLock::new();

/// 获取指定子带数 (4 或 8) 的定点表
pub(crate) fn filter_tables(subbands: usize) -> &'static FilterTables {
    if subbands == 4 {
        TABLES_4.get_or_init(|| FilterTables::build(&PROTO_4_40))
    } else {
        TABLES_8.get_or_init(|| FilterTables::build(&PROTO_8_80))
    }
}
