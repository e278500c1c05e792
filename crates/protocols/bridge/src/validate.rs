//! Transfer request validation

use rust_decimal::Decimal;
use swap_core::{Blockchain, ProtocolError, TransferRequest};

/// Basic format check for an EVM destination address
pub fn validate_destination_address(chain: Blockchain, address: &str) -> Result<(), String> {
    if address.is_empty() {
        return Err("Address cannot be empty".to_string());
    }
    if !address.starts_with("0x") {
        return Err(format!("{} address must start with '0x'", chain));
    }
    if address.len() != 42 {
        return Err(format!(
            "{} address must be 42 characters (0x + 40 hex chars)",
            chain
        ));
    }
    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("Address contains non-hex characters".to_string());
    }
    Ok(())
}

/// Check a request against its pair before anything touches the chain
pub fn validate_request(request: &TransferRequest) -> Result<(), ProtocolError> {
    if !request.pair.serves(request.from_chain, request.to_chain) {
        return Err(ProtocolError::UnsupportedRoute {
            from: request.from_chain,
            to: request.to_chain,
        });
    }

    let token = request
        .source_token()
        .ok_or(ProtocolError::UnsupportedRoute {
            from: request.from_chain,
            to: request.to_chain,
        })?;

    if request.amount <= Decimal::ZERO {
        return Err(ProtocolError::InvalidAmount {
            message: format!("{} must be greater than zero", request.amount),
        });
    }
    if request.amount < token.min_amount {
        return Err(ProtocolError::BelowMinimum {
            amount: request.amount.to_string(),
            min: token.min_amount.to_string(),
        });
    }
    if request.amount > token.max_amount {
        return Err(ProtocolError::AboveMaximum {
            amount: request.amount.to_string(),
            max: token.max_amount.to_string(),
        });
    }

    validate_destination_address(request.to_chain, &request.to_address)
        .map_err(|reason| ProtocolError::InvalidAddress { reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use swap_core::{PairSide, Token, TokenPair};

    fn side(chain: Blockchain) -> PairSide {
        PairSide {
            token: Token {
                blockchain: chain,
                address: Address::repeat_byte(0x01),
                symbol: "RBC".to_string(),
                name: "Rubic".to_string(),
                decimals: 18,
                min_amount: Decimal::from(200),
                max_amount: Decimal::from(100_100),
            },
            swap_contract: Address::repeat_byte(0x02),
            fee: None,
        }
    }

    fn request(amount: i64, to_address: &str) -> TransferRequest {
        TransferRequest {
            from_chain: Blockchain::Ethereum,
            to_chain: Blockchain::BinanceSmartChain,
            pair: TokenPair::new(
                "RBC",
                side(Blockchain::Ethereum),
                side(Blockchain::BinanceSmartChain),
            )
            .unwrap(),
            amount: Decimal::from(amount),
            to_address: to_address.to_string(),
            on_transaction_hash: None,
        }
    }

    const DEST: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f2bD08";

    #[test]
    fn test_valid_request() {
        assert!(validate_request(&request(500, DEST)).is_ok());
        assert!(validate_request(&request(200, DEST)).is_ok());
        assert!(validate_request(&request(100_100, DEST)).is_ok());
    }

    #[test]
    fn test_amount_bounds() {
        assert!(matches!(
            validate_request(&request(0, DEST)),
            Err(ProtocolError::InvalidAmount { .. })
        ));
        assert!(matches!(
            validate_request(&request(199, DEST)),
            Err(ProtocolError::BelowMinimum { .. })
        ));
        assert!(matches!(
            validate_request(&request(100_101, DEST)),
            Err(ProtocolError::AboveMaximum { .. })
        ));
    }

    #[test]
    fn test_route_outside_pair() {
        let mut req = request(500, DEST);
        req.to_chain = Blockchain::Polygon;
        assert!(matches!(
            validate_request(&req),
            Err(ProtocolError::UnsupportedRoute { .. })
        ));
    }

    #[test]
    fn test_destination_address() {
        assert!(matches!(
            validate_request(&request(500, "")),
            Err(ProtocolError::InvalidAddress { .. })
        ));
        assert!(validate_destination_address(Blockchain::Polygon, "0x742d35").is_err());
        assert!(validate_destination_address(
            Blockchain::Polygon,
            "742d35Cc6634C0532925a3b844Bc9e7595f2bD0800"
        )
        .is_err());
        assert!(validate_destination_address(
            Blockchain::Polygon,
            "0xZZ2d35Cc6634C0532925a3b844Bc9e7595f2bD08"
        )
        .is_err());
    }
}
