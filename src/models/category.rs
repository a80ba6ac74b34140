/// How a ledger entry moves money relative to the shared account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Income,
    /// A shared expense the member paid out of pocket.
    SharedPaidFromPersonal,
    /// A personal expense the shared account paid.
    PersonalPaidFromShared,
    PocketMoney,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::SharedPaidFromPersonal => "SHARED_PAID_FROM_PERSONAL",
            Self::PersonalPaidFromShared => "PERSONAL_PAID_FROM_SHARED",
            Self::PocketMoney => "POCKET_MONEY",
        }
    }

    /// Exact match on the stored spelling. Older sheets use the long
    /// `..._SHOULD_PAY_BUT_..._PAID` names, which are accepted too.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INCOME" => Some(Self::Income),
            "SHARED_PAID_FROM_PERSONAL" | "SHARED_SHOULD_PAY_BUT_PERSONAL_PAID" => {
                Some(Self::SharedPaidFromPersonal)
            }
            "PERSONAL_PAID_FROM_SHARED" | "PERSONAL_SHOULD_PAY_BUT_SHARED_PAID" => {
                Some(Self::PersonalPaidFromShared)
            }
            "POCKET_MONEY" => Some(Self::PocketMoney),
            _ => None,
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::Income,
            Self::SharedPaidFromPersonal,
            Self::PersonalPaidFromShared,
            Self::PocketMoney,
        ]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
