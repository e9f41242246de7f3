/// Label of the "add currency" button on the management keyboard.
pub const ADD_CURRENCY_LABEL: &str = "Add currency";
/// Label of the "delete currency" button on the management keyboard.
pub const DELETE_CURRENCY_LABEL: &str = "Delete currency";
/// Label of the "change rate" button on the management keyboard.
pub const CHANGE_RATE_LABEL: &str = "Change rate";

/// The commands the bot understands.
///
/// The set is fixed: the conversation engine models exactly these flows
/// rather than an extensible command registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Version,
    ListCurrencies,
    Manage,
    AddCurrency,
    DeleteCurrency,
    ChangeRate,
    Convert,
    Cancel,
    Triangle(Vec<String>),
    Unknown(String),
}

impl Command {
    /// Resolve a slash-command name (prefix already stripped) and its
    /// arguments.
    pub fn from_name(name: &str, args: Vec<String>) -> Self {
        match name.to_lowercase().as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "version" => Command::Version,
            "currencies" | "list" => Command::ListCurrencies,
            "manage" => Command::Manage,
            "convert" => Command::Convert,
            "cancel" => Command::Cancel,
            "triangle" => Command::Triangle(args),
            other => Command::Unknown(other.to_string()),
        }
    }

    /// Resolve a management-keyboard button label into its flow trigger.
    pub fn from_button_label(text: &str) -> Option<Self> {
        match text.trim() {
            ADD_CURRENCY_LABEL => Some(Command::AddCurrency),
            DELETE_CURRENCY_LABEL => Some(Command::DeleteCurrency),
            CHANGE_RATE_LABEL => Some(Command::ChangeRate),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_names_case_insensitively() {
        assert_eq!(Command::from_name("start", vec![]), Command::Start);
        assert_eq!(Command::from_name("Convert", vec![]), Command::Convert);
        assert_eq!(
            Command::from_name("currencies", vec![]),
            Command::ListCurrencies
        );
        assert_eq!(Command::from_name("list", vec![]), Command::ListCurrencies);
    }

    #[test]
    fn unknown_names_are_preserved() {
        assert_eq!(
            Command::from_name("frobnicate", vec![]),
            Command::Unknown("frobnicate".to_string())
        );
    }

    #[test]
    fn triangle_keeps_its_arguments() {
        let args = vec!["3".to_string(), "4".to_string(), "5".to_string()];
        assert_eq!(
            Command::from_name("triangle", args.clone()),
            Command::Triangle(args)
        );
    }

    #[test]
    fn button_labels_map_to_flow_triggers() {
        assert_eq!(
            Command::from_button_label("Add currency"),
            Some(Command::AddCurrency)
        );
        assert_eq!(
            Command::from_button_label("  Change rate "),
            Some(Command::ChangeRate)
        );
        assert_eq!(Command::from_button_label("USD"), None);
    }
}
