//! 指数成分股（静态列表）
//!
//! 代码为交易所代码，不带后缀

/// NIFTY 50
pub const NIFTY_50: [&str; 50] = [
    "ADANIENT", "ADANIPORTS", "APOLLOHOSP", "ASIANPAINT", "AXISBANK", "BAJAJ-AUTO",
    "BAJFINANCE", "BAJAJFINSV", "BPCL", "BHARTIARTL", "BRITANNIA", "CIPLA", "COALINDIA",
    "DIVISLAB", "DRREDDY", "EICHERMOT", "GRASIM", "HCLTECH", "HDFCBANK", "HDFCLIFE",
    "HEROMOTOCO", "HINDALCO", "HINDUNILVR", "ICICIBANK", "ITC", "INDUSINDBK", "INFY",
    "JSWSTEEL", "KOTAKBANK", "LTIM", "LT", "M&M", "MARUTI", "NTPC", "NESTLEIND", "ONGC",
    "POWERGRID", "RELIANCE", "SBILIFE", "SHRIRAMFIN", "SBIN", "SUNPHARMA", "TCS", "TATACONSUM",
    "TATAMOTORS", "TATASTEEL", "TECHM", "TITAN", "ULTRACEMCO", "WIPRO",
];

/// NIFTY NEXT 50（不含 NIFTY 50 成分）
pub const NIFTY_NEXT_50: [&str; 50] = [
    "ABB", "ADANIENSOL", "ADANIGREEN", "ADANIPOWER", "ATGL", "AMBUJACEM", "DMART", "BAJAJHLDNG",
    "BANKBARODA", "BERGEPAINT", "BEL", "BOSCHLTD", "CANBK", "CHOLAFIN", "COLPAL", "DLF",
    "DABUR", "GAIL", "GODREJCP", "HAVELLS", "HAL", "ICICIGI", "ICICIPRULI", "IOC", "IRCTC",
    "IRFC", "NAUKRI", "INDIGO", "JINDALSTEL", "JIOFIN", "LICI", "MARICO", "MOTHERSON",
    "PIDILITIND", "PFC", "PNB", "RECLTD", "SBICARD", "SRF", "MCDOWELL-N", "SHREECEM", "SIEMENS",
    "TATAPOWER", "TORNTPHARM", "TVSMOTOR", "VBL", "VEDL", "ZOMATO", "ZYDUSLIFE", "TRENT",
];

/// BSE SENSEX
pub const SENSEX_30: [&str; 30] = [
    "ASIANPAINT", "AXISBANK", "BAJAJFINSV", "BAJFINANCE", "BHARTIARTL", "HCLTECH", "HDFCBANK",
    "HINDUNILVR", "ICICIBANK", "INDUSINDBK", "INFY", "ITC", "JSWSTEEL", "KOTAKBANK", "LT",
    "M&M", "MARUTI", "NESTLEIND", "NTPC", "POWERGRID", "RELIANCE", "SBIN", "SUNPHARMA",
    "TATAMOTORS", "TATASTEEL", "TCS", "TECHM", "TITAN", "ULTRACEMCO", "WIPRO",
];

/// S&P BSE 100
pub const BSE_100: [&str; 100] = [
    "ABB", "ACC", "ADANIENT", "ADANIPORTS", "AMBUJACEM", "ASHOKLEY", "ASIANPAINT", "AUROPHARMA",
    "AXISBANK", "BAJAJ-AUTO", "BAJAJFINSV", "BAJFINANCE", "BANKBARODA", "BERGEPAINT",
    "BHARATFORG", "BHARTIARTL", "BOSCHLTD", "BPCL", "BRITANNIA", "ZYDUSLIFE", "CANBK",
    "CHOLAFIN", "CIPLA", "COALINDIA", "COLPAL", "CONCOR", "CUMMINSIND", "DABUR", "DIVISLAB",
    "DRREDDY", "EICHERMOT", "EXIDEIND", "FEDERALBNK", "GAIL", "GODREJCP", "GRASIM", "HAVELLS",
    "HCLTECH", "HDFCLIFE", "HDFCBANK", "HEROMOTOCO", "HINDALCO", "HINDPETRO", "HINDUNILVR",
    "SBILIFE", "ICICIBANK", "ICICIPRULI", "IDFCFIRSTB", "IGL", "INDUSINDBK", "INFY", "IOC",
    "ITC", "JSWSTEEL", "JUBLFOOD", "KOTAKBANK", "LICHSGFIN", "LT", "LUPIN", "M&M", "MARICO",
    "MARUTI", "MCDOWELL-N", "MOTHERSON", "MRF", "MUTHOOTFIN", "NATIONALUM", "NESTLEIND", "NMDC",
    "NTPC", "ONGC", "PAGEIND", "TRENT", "PETRONET", "PIDILITIND", "POWERGRID", "RELIANCE",
    "SAIL", "SBIN", "SHREECEM", "SIEMENS", "SRF", "SUNPHARMA", "TATACHEM", "TATACONSUM",
    "TATAMOTORS", "TATAPOWER", "TATASTEEL", "TCS", "TECHM", "TITAN", "TORNTPHARM", "TORNTPOWER",
    "TVSMOTOR", "ULTRACEMCO", "UPL", "VEDL", "VOLTAS", "WIPRO", "DLF",
];
