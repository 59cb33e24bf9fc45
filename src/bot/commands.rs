use teloxide::utils::command::BotCommands;

/// Telegram bot commands
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case", description = "Trading assistant commands:")]
pub enum Command {
    #[command(description = "Show current price")]
    Price,

    #[command(description = "Show RSI(14) on 15m candles")]
    Rsi,

    #[command(description = "Bollinger Bands + RSI market analysis")]
    Analysis,

    #[command(description = "Show free balances")]
    Balance,

    #[command(description = "List open orders")]
    Orders,

    #[command(description = "Buy with a share of the quote balance (usage: /buy <25|50|75|100> [price])")]
    Buy(String),

    #[command(description = "Sell a share of the base balance (usage: /sell <25|50|75|100> [price])")]
    Sell(String),

    #[command(description = "Arm auto-sell at a target price (usage: /autosell <target> [quantity])")]
    Autosell(String),

    #[command(description = "Show auto-sell status")]
    SellStatus,

    #[command(description = "Cancel auto-sell")]
    SellCancel,

    #[command(description = "Start or stop crash alerts")]
    Monitor,

    #[command(description = "Show recent journal entries (usage: /journal [count])")]
    Journal(String),

    #[command(description = "Show help message")]
    Help,
}
