use crate::{macros::vocabulary, set::Set};

vocabulary! {
    /// Optional vector behavior attached to a mnemonic or an operand token.
    pub enum Decorator(Decorator) {
        Mask = "{K}",
        Zero = "{z}",
        SuppressAll = "{sae}",
        EmbeddedRounding = "{er}",
        Broadcast32 = "|B32",
        Broadcast64 = "|B64",
        Broadcast16 = "|B16",
        NewDataDestination = "{ND}",
        NoFlags = "{NF}",
        ZeroUpper = "{ZU}",
    }
}

vocabulary! {
    /// Decorator support of an instruction.
    pub enum DecoratorFlag(Decorator) {
        Mask = "MASK",
        Zero = "ZERO",
        Sae = "SAE",
        Er = "ER",
        Broadcast = "BROADCAST",
        Nd = "ND",
        Zu = "ZU",
        Nf = "NF",
    }
}

vocabulary! {
    /// Decorator support of an operand.
    pub enum OperandDecorator(Decorator) {
        Mask = "MASK",
        Zero = "ZERO",
        Sae = "SAE",
        Er = "ER",
        B32 = "B32",
        B64 = "B64",
        B16 = "B16",
    }
}

impl Decorator {
    pub const fn instruction_flag(&self) -> DecoratorFlag {
        match self {
            Self::Mask => DecoratorFlag::Mask,
            Self::Zero => DecoratorFlag::Zero,
            Self::SuppressAll => DecoratorFlag::Sae,
            Self::EmbeddedRounding => DecoratorFlag::Er,
            Self::Broadcast32 | Self::Broadcast64 | Self::Broadcast16 => DecoratorFlag::Broadcast,
            Self::NewDataDestination => DecoratorFlag::Nd,
            Self::NoFlags => DecoratorFlag::Nf,
            Self::ZeroUpper => DecoratorFlag::Zu,
        }
    }

    pub const fn operand_flag(&self) -> Option<OperandDecorator> {
        Some(match self {
            Self::Mask => OperandDecorator::Mask,
            Self::Zero => OperandDecorator::Zero,
            Self::SuppressAll => OperandDecorator::Sae,
            Self::EmbeddedRounding => OperandDecorator::Er,
            Self::Broadcast32 => OperandDecorator::B32,
            Self::Broadcast64 => OperandDecorator::B64,
            Self::Broadcast16 => OperandDecorator::B16,
            _ => return None,
        })
    }
}

pub type Decorators = Set<Decorator>;

impl Set<Decorator> {
    /// Removes every known decorator from `token`.
    ///
    /// Returns the bare token and the decorators found, in vocabulary order.
    pub fn strip(token: &str) -> (String, Self) {
        let mut bare = token.to_owned();
        let mut found = Self::new();
        for deco in Decorator::ALL {
            if bare.contains(deco.as_str()) {
                found.insert(*deco);
                bare = bare.replace(deco.as_str(), "");
            }
        }
        (bare, found)
    }

    /// Returns the decorator flags of the instruction without duplicates.
    pub fn instruction_flags(&self) -> Set<DecoratorFlag> {
        self.iter().map(|i| i.instruction_flag()).collect()
    }

    /// Returns the decorator flags of an operand.
    pub fn operand_flags(&self) -> Set<OperandDecorator> {
        self.iter().filter_map(|i| i.operand_flag()).collect()
    }
}
