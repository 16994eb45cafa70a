// ==========================================
// POSM 成本计算 - 领域类型定义
// ==========================================
// 职责: 优先级 / 价格区间 等值类型
// ==========================================

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ==========================================
// 优先级 (Priority)
// ==========================================
// 1 = 带缓冲+最小起订量, 2 = 仅取整
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Buffered, // 1
    Plain,    // 2
}

impl Priority {
    /// 从原始优先级代码解析（仅接受 1/2）
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Priority::Buffered),
            2 => Some(Priority::Plain),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Priority::Buffered => 1,
            Priority::Plain => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// 序列化为原始代码 1/2
impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        Priority::from_code(code)
            .ok_or_else(|| de::Error::custom(format!("无效优先级: {}", code)))
    }
}

// ==========================================
// 价格区间 (Price Band)
// ==========================================
// 8 个连续区间, 两端闭合, 最高档开放
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceBand {
    UpTo200,
    From201To500,
    From501To1000,
    From1001To2000,
    From2001To3000,
    From3001To4000,
    From4001To5000,
    Above5000,
}

impl PriceBand {
    pub const ALL: [PriceBand; 8] = [
        PriceBand::UpTo200,
        PriceBand::From201To500,
        PriceBand::From501To1000,
        PriceBand::From1001To2000,
        PriceBand::From2001To3000,
        PriceBand::From3001To4000,
        PriceBand::From4001To5000,
        PriceBand::Above5000,
    ];

    /// 数量 → 价格区间
    pub fn from_quantity(quantity: u64) -> Self {
        Self::ALL
            .into_iter()
            .find(|band| band.contains(quantity))
            .unwrap_or(PriceBand::Above5000)
    }

    /// 区间下界（含）
    pub fn lower(self) -> u64 {
        match self {
            PriceBand::UpTo200 => 0,
            PriceBand::From201To500 => 201,
            PriceBand::From501To1000 => 501,
            PriceBand::From1001To2000 => 1001,
            PriceBand::From2001To3000 => 2001,
            PriceBand::From3001To4000 => 3001,
            PriceBand::From4001To5000 => 4001,
            PriceBand::Above5000 => 5001,
        }
    }

    /// 区间上界（含）, 最高档为 None
    pub fn upper(self) -> Option<u64> {
        match self {
            PriceBand::UpTo200 => Some(200),
            PriceBand::From201To500 => Some(500),
            PriceBand::From501To1000 => Some(1000),
            PriceBand::From1001To2000 => Some(2000),
            PriceBand::From2001To3000 => Some(3000),
            PriceBand::From3001To4000 => Some(4000),
            PriceBand::From4001To5000 => Some(5000),
            PriceBand::Above5000 => None,
        }
    }

    pub fn contains(self, quantity: u64) -> bool {
        quantity >= self.lower() && self.upper().map_or(true, |upper| quantity <= upper)
    }

    /// 价格表中使用的区间标签
    pub fn label(self) -> &'static str {
        match self {
            PriceBand::UpTo200 => "<200",
            PriceBand::From201To500 => "201-500",
            PriceBand::From501To1000 => "501-1000",
            PriceBand::From1001To2000 => "1001 - 2000",
            PriceBand::From2001To3000 => "2001 - 3000",
            PriceBand::From3001To4000 => "3001 - 4000",
            PriceBand::From4001To5000 => "4001 - 5000",
            PriceBand::Above5000 => ">5000",
        }
    }

    /// 解析区间标签（忽略空白, "1001-2000" 与 "1001 - 2000" 等价）
    pub fn from_label(label: &str) -> Option<Self> {
        let compact: String = label.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL.into_iter().find(|band| {
            let canonical: String = band.label().chars().filter(|c| !c.is_whitespace()).collect();
            canonical == compact
        })
    }
}

impl fmt::Display for PriceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// 输出表中以标签形式出现
impl Serialize for PriceBand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for PriceBand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        PriceBand::from_label(&label)
            .ok_or_else(|| de::Error::custom(format!("未知价格区间: {}", label)))
    }
}
