//! Block Segmenter Module
//!
//! The core state machine. Walks the grid once with a single forward cursor
//! (it never rewinds past the current block), recognizing order-block
//! boundaries, item sub-regions, and termination conditions:
//!
//! ```text
//! Scanning -> Order -> BlankGap -> ItemHeader -> Items -> Scanning ...
//! ```
//!
//! Each transition function consumes rows and returns the next state, so the
//! cursor is threaded explicitly instead of being mutated across nested
//! loops. A malformed block degrades gracefully: the order is kept with zero
//! items, an event is logged, and scanning resumes at the next block.

use crate::aggregate::ItemStore;
use crate::audit::AuditLog;
use crate::builder::ParserConfig;
use crate::grid::RawGrid;
use crate::header::{self, FieldReader, HeaderMap, ITEM_CODE_KEY};
use crate::types::{Item, Order};

/// Segmentation state. `Order`, `ItemHeader` and `Items` carry the context
/// the next transition needs; everything else lives in the cursor.
enum State {
    Scanning,
    Order { data_row: usize },
    BlankGap { order_id: String },
    ItemHeader { order_id: String },
    Items { order_id: String, map: HeaderMap },
    Done,
}

pub(crate) struct Segmenter<'a> {
    grid: &'a RawGrid,
    reference: &'a HeaderMap,
    config: &'a ParserConfig,
    log: &'a mut AuditLog,
    cursor: usize,
    orders: Vec<Order>,
    items: ItemStore,
}

impl<'a> Segmenter<'a> {
    pub(crate) fn new(
        grid: &'a RawGrid,
        reference: &'a HeaderMap,
        config: &'a ParserConfig,
        log: &'a mut AuditLog,
    ) -> Self {
        Self {
            grid,
            reference,
            config,
            log,
            cursor: config.banner_rows,
            orders: Vec::new(),
            items: ItemStore::new(),
        }
    }

    /// Run the machine to grid exhaustion.
    pub(crate) fn run(mut self) -> (Vec<Order>, ItemStore) {
        let mut state = State::Scanning;
        loop {
            state = match state {
                State::Scanning => self.scan_for_block(),
                State::Order { data_row } => self.read_order(data_row),
                State::BlankGap { order_id } => self.skip_blank_gap(order_id),
                State::ItemHeader { order_id } => self.read_item_header(order_id),
                State::Items { order_id, map } => self.read_items(order_id, map),
                State::Done => break,
            };
        }
        (self.orders, self.items)
    }

    /// Advance until a block-start row is found. A repeated copy of the
    /// reference header means the *next* row is the order data row; a row
    /// whose first cell is an order-type token is the data row itself.
    fn scan_for_block(&mut self) -> State {
        while self.cursor < self.grid.len() {
            let row = self.grid.row(self.cursor);

            if header::is_block_header(row, &self.config.required_tokens) {
                let data_row = self.cursor + 1;
                self.cursor = data_row;
                if data_row >= self.grid.len() {
                    return State::Done;
                }
                return State::Order { data_row };
            }

            if self.is_order_type_row(row) {
                return State::Order {
                    data_row: self.cursor,
                };
            }

            self.cursor += 1;
        }
        State::Done
    }

    fn is_order_type_row(&self, row: &[String]) -> bool {
        let first = row.first().map(|c| c.trim().to_uppercase()).unwrap_or_default();
        self.config
            .order_type_tokens
            .iter()
            .any(|t| t.as_str() == first)
    }

    /// Extract all order fields through the reference header map, synthesize
    /// the id when the source cell is blank, and append the order.
    fn read_order(&mut self, data_row: usize) -> State {
        let fields = FieldReader::new(
            self.grid.row(data_row),
            self.reference,
            self.config.number_format,
        );

        let mut order_id = fields.str_field("id");
        if order_id.is_empty() {
            order_id = format!("UNKNOWN_{}", data_row);
            self.log
                .warn_at(format!("order id missing, using '{}'", order_id), data_row);
        }

        self.log_garbled_order_fields(&fields, data_row);

        let order = Order {
            order_id: order_id.clone(),
            order_type: fields.str_field("tipo"),
            seller: fields.str_field("vendedor"),
            customer: fields.str_field("cliente"),
            customer_signup_date: fields.str_field("data_cad_cliente"),
            customer_origin: fields.str_field("origem_cliente"),
            customer_phone: fields.str_field("telefone_cliente"),
            closed_at: fields.str_field("datahora_fechamento"),
            received_at: fields.str_field("datahora_recebimento"),
            product_value: fields.float_field("vlr_produtos"),
            service_value: fields.float_field("vlr_servicos"),
            freight: fields.float_field("frete"),
            other_expenses: fields.float_field("out_desp"),
            interest: fields.float_field("juros"),
            tc: fields.float_field("tc"),
            discount: fields.float_field("desconto"),
            manual_credit: fields.float_field("cred_man"),
            net_value: fields.float_field("vlr_liquido"),
            cost: fields.float_field("custo"),
            profit_pct: fields.percent_field("%lucro"),
            embedded_interest: fields.float_field("juros_embutidos"),
            embedded_freight_cif: fields.float_field("frete_cif_embutidos"),
            real_retention: fields.float_field("retencao_real"),
            presumed_profit_base: fields.float_field("base_lucro_pres"),
            presumed_profit_pct: fields.percent_field("%lucro_pres"),
            presumed_profit_value: fields.float_field("vlr_lucro_pres"),
            purchase_cost: fields.float_field("custo_compra"),
            external_seller: fields.str_field("vendedor_externo"),
            customer_reg_date: fields.str_field("dt_cad_cliente"),
            origin: fields.str_field("origem"),
            average_term: fields.float_field("prazo_medio"),
            general_discount: fields.float_field("desconto_geral"),
            general_discount_pct: fields.percent_field("%_desconto_geral"),
            impulse_value: fields.float_field("valor_impulso"),
            gift_value: fields.float_field("valor_brinde"),
            grouped_delivery: fields.str_field("ent_agrupada"),
            inserted_by: fields.str_field("usuario_insercao"),
            direct_sale_commission: fields.float_field("vlr_comis_emp_vda_direta"),
            price_table: fields.str_field("tab_preco"),
            return_order_ref: fields.str_field("pedido_da_devolucao"),
            source_row: data_row,
        };

        self.log
            .info_at(format!("order '{}' captured", order.order_id), data_row);
        tracing::debug!(order_id = order.order_id.as_str(), row = data_row, "order captured");
        self.orders.push(order);

        self.cursor = data_row + 1;
        State::BlankGap { order_id }
    }

    /// Skip the blank separator between the order row and the item header.
    /// A missing separator is tolerated (warning), not an abort.
    fn skip_blank_gap(&mut self, order_id: String) -> State {
        if self.cursor < self.grid.len() && !self.grid.is_blank_row(self.cursor) {
            self.log.warn_at(
                format!(
                    "expected a blank row after order '{}' data, found content; continuing",
                    order_id
                ),
                self.cursor,
            );
        }

        while self.cursor < self.grid.len() && self.grid.is_blank_row(self.cursor) {
            self.cursor += 1;
        }

        if self.cursor >= self.grid.len() {
            return State::Done;
        }
        State::ItemHeader { order_id }
    }

    /// Normalize the candidate item header. Without the mandatory item-code
    /// column, item extraction is abandoned for this block only and scanning
    /// resumes at the same cursor (no speculative consumption).
    fn read_item_header(&mut self, order_id: String) -> State {
        match header::find_item_header(self.grid.row(self.cursor)) {
            Some(map) => {
                self.cursor += 1;
                State::Items { order_id, map }
            }
            None => {
                self.log.error_at(
                    format!(
                        "item header for order '{}' lacks a '{}' column; items skipped",
                        order_id, ITEM_CODE_KEY
                    ),
                    self.cursor,
                );
                tracing::warn!(
                    order_id = order_id.as_str(),
                    row = self.cursor,
                    "block degraded: no item-code column"
                );
                State::Scanning
            }
        }
    }

    /// Consume item rows until a block-start signal (not consumed), a second
    /// consecutive blank row (consumed), or grid exhaustion.
    fn read_items(&mut self, order_id: String, map: HeaderMap) -> State {
        let mut blanks = 0usize;

        while self.cursor < self.grid.len() {
            let row = self.grid.row(self.cursor);

            if header::is_block_header(row, &self.config.required_tokens)
                || self.is_order_type_row(row)
            {
                self.log.info_at(
                    format!("new block detected; end of items for '{}'", order_id),
                    self.cursor,
                );
                return State::Scanning;
            }

            if self.grid.is_blank_row(self.cursor) {
                blanks += 1;
                if blanks >= 2 {
                    self.log.info_at(
                        format!("two blank rows; end of items for '{}'", order_id),
                        self.cursor,
                    );
                    self.cursor += 1;
                    return State::Scanning;
                }
                self.cursor += 1;
                continue;
            }
            blanks = 0;

            let fields = FieldReader::new(row, &map, self.config.number_format);

            let name = fields.str_field("nome");
            if name
                .to_lowercase()
                .starts_with(&self.config.totals_marker)
            {
                self.log.info_at(
                    format!("embedded totals row skipped: '{}'", name),
                    self.cursor,
                );
                self.cursor += 1;
                continue;
            }

            let code = fields.str_field(ITEM_CODE_KEY);
            if code.is_empty() {
                // Noise/spacer row inside the item range
                self.cursor += 1;
                continue;
            }

            self.log_garbled_item_fields(&fields, self.cursor);

            let quantity = fields.float_field("quantidade");
            let unit_price = fields.float_field("preco_venda");
            let interest_discount = fields.float_field("jurosdesc");

            let item = Item {
                order_id: order_id.clone(),
                code,
                name,
                brand: fields.str_field("marca"),
                promotion: fields.str_field("promocao"),
                quantity,
                unit_price,
                interest_discount,
                subtotal: quantity * unit_price + interest_discount,
                net_total: fields.float_field("total_liquido"),
                cost_value: fields.float_field("valor_custo"),
                profit_pct: fields.percent_field("%_lucro"),
                purchase_cost: fields.float_field("custo_compra"),
                source_row: self.cursor,
            };

            if !self.items.upsert(item) {
                self.log.info_at(
                    format!("repeated item row merged for order '{}'", order_id),
                    self.cursor,
                );
            }

            self.cursor += 1;
        }

        State::Done
    }

    fn log_garbled_order_fields(&mut self, fields: &FieldReader<'_>, row: usize) {
        for key in ["vlr_produtos", "vlr_liquido", "desconto", "frete", "custo"] {
            if fields.is_garbled_number(key) {
                self.log.verbose_at(
                    format!("unparseable number in order column '{}', coerced to 0", key),
                    row,
                );
            }
        }
    }

    fn log_garbled_item_fields(&mut self, fields: &FieldReader<'_>, row: usize) {
        for key in ["quantidade", "preco_venda", "jurosdesc"] {
            if fields.is_garbled_number(key) {
                self.log.verbose_at(
                    format!("unparseable number in item column '{}', coerced to 0", key),
                    row,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ParserConfig;
    use crate::header::HeaderMap;

    fn reference_map() -> HeaderMap {
        let header: Vec<String> = ["Tipo", "Id", "Vendedor", "Cliente"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        HeaderMap::from_row(&header)
    }

    fn run(grid: &RawGrid) -> (Vec<Order>, Vec<Item>, AuditLog) {
        let config = ParserConfig::default();
        let reference = reference_map();
        let mut log = AuditLog::new(false);
        let seg = Segmenter::new(grid, &reference, &config, &mut log);
        let (orders, store) = seg.run();
        (orders, store.into_items(), log)
    }

    #[test]
    fn test_single_block_with_items() {
        let grid = RawGrid::from_rows(vec![
            vec!["banner"],
            vec![""],
            vec![""],
            vec!["Tipo", "Id", "Vendedor", "Cliente"],
            vec!["PED", "100", "Ana", "Cliente X"],
            vec!["", "", "", ""],
            vec!["Código", "Nome", "Quantidade", "Preço Venda", "Juros/Desc."],
            vec!["X1", "Widget", "2", "10,00", "0"],
            vec!["X2", "Gadget", "1", "5,00", "-1"],
            vec![""],
            vec![""],
        ]);

        let (orders, items, _log) = run(&grid);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "100");
        assert_eq!(orders[0].order_type, "PED");
        assert_eq!(orders[0].seller, "Ana");
        assert_eq!(orders[0].source_row, 4);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].code, "X1");
        assert!((items[0].subtotal - 20.0).abs() < 1e-9);
        assert!((items[1].subtotal - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_item_rows_merge() {
        let grid = RawGrid::from_rows(vec![
            vec![""],
            vec![""],
            vec![""],
            vec!["Tipo", "Id", "Vendedor"],
            vec!["PED", "7", "Rui"],
            vec![""],
            vec!["Código", "Nome", "Quantidade", "Preço Venda", "Juros/Desc."],
            vec!["X1", "Widget", "2", "10", "1"],
            vec!["X1", "Widget", "3", "10", "2"],
        ]);

        let (_orders, items, _log) = run(&grid);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert!((item.quantity - 5.0).abs() < 1e-9);
        assert!((item.interest_discount - 3.0).abs() < 1e-9);
        assert!((item.subtotal - 53.0).abs() < 1e-9);
        assert_eq!(item.source_row, 7); // first occurrence wins
    }

    #[test]
    fn test_missing_id_synthesized() {
        let grid = RawGrid::from_rows(vec![
            vec![""],
            vec![""],
            vec![""],
            vec!["Tipo", "Id", "Vendedor"],
            vec!["PED", "", "Ana"],
        ]);

        let (orders, _items, log) = run(&grid);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "UNKNOWN_4");
        assert!(log.lines().iter().any(|l| l.contains("UNKNOWN_4")));
    }

    #[test]
    fn test_bare_order_type_row_starts_block() {
        // Second block begins with a PED row, no repeated header
        let grid = RawGrid::from_rows(vec![
            vec![""],
            vec![""],
            vec![""],
            vec!["Tipo", "Id", "Vendedor"],
            vec!["PED", "1", "Ana"],
            vec![""],
            vec!["Código", "Nome", "Quantidade", "Preço Venda", "Juros/Desc."],
            vec!["A", "Um", "1", "2", "0"],
            vec![""],
            vec![""],
            vec!["ACU", "2", "Bia"],
            vec![""],
            vec!["Código", "Nome", "Quantidade", "Preço Venda", "Juros/Desc."],
            vec!["B", "Dois", "1", "3", "0"],
        ]);

        let (orders, items, _log) = run(&grid);
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[1].order_id, "2");
        assert_eq!(orders[1].order_type, "ACU");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_repeated_header_ends_items_without_consuming() {
        let grid = RawGrid::from_rows(vec![
            vec![""],
            vec![""],
            vec![""],
            vec!["Tipo", "Id", "Vendedor"],
            vec!["PED", "1", "Ana"],
            vec![""],
            vec!["Código", "Nome", "Quantidade", "Preço Venda", "Juros/Desc."],
            vec!["A", "Um", "1", "2", "0"],
            vec!["Tipo", "Id", "Vendedor"],
            vec!["DEV", "2", "Bia"],
            vec![""],
            vec!["Código", "Nome", "Quantidade", "Preço Venda", "Juros/Desc."],
            vec!["B", "Dois", "4", "1", "0"],
        ]);

        let (orders, items, _log) = run(&grid);
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[1].order_type, "DEV");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].order_id, "2");
    }

    #[test]
    fn test_block_without_item_code_column_degrades() {
        let grid = RawGrid::from_rows(vec![
            vec![""],
            vec![""],
            vec![""],
            vec!["Tipo", "Id", "Vendedor"],
            vec!["PED", "1", "Ana"],
            vec![""],
            vec!["Nome", "Quantidade"], // no Código column
            vec!["Um", "1"],
            vec![""],
            vec![""],
            vec!["PED", "2", "Bia"],
            vec![""],
            vec!["Código", "Nome", "Quantidade", "Preço Venda", "Juros/Desc."],
            vec!["B", "Dois", "1", "9", "0"],
        ]);

        let (orders, items, log) = run(&grid);
        assert_eq!(orders.len(), 2);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order_id, "2");
        assert_eq!(
            log.with_severity(crate::audit::Severity::Error).count(),
            1
        );
    }

    #[test]
    fn test_single_blank_inside_items_tolerated() {
        let grid = RawGrid::from_rows(vec![
            vec![""],
            vec![""],
            vec![""],
            vec!["Tipo", "Id", "Vendedor"],
            vec!["PED", "1", "Ana"],
            vec![""],
            vec!["Código", "Nome", "Quantidade", "Preço Venda", "Juros/Desc."],
            vec!["A", "Um", "1", "2", "0"],
            vec![""],
            vec!["B", "Dois", "1", "3", "0"],
        ]);

        let (_orders, items, _log) = run(&grid);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_embedded_totals_row_skipped() {
        let grid = RawGrid::from_rows(vec![
            vec![""],
            vec![""],
            vec![""],
            vec!["Tipo", "Id", "Vendedor"],
            vec!["PED", "1", "Ana"],
            vec![""],
            vec!["Código", "Nome", "Quantidade", "Preço Venda", "Juros/Desc."],
            vec!["A", "Um", "1", "2", "0"],
            vec!["ZZZ", "Totais de Pedidos", "99", "99", "0"],
        ]);

        let (_orders, items, log) = run(&grid);
        assert_eq!(items.len(), 1);
        assert!(log.lines().iter().any(|l| l.contains("totals row skipped")));
    }

    #[test]
    fn test_missing_blank_separator_warns() {
        let grid = RawGrid::from_rows(vec![
            vec![""],
            vec![""],
            vec![""],
            vec!["Tipo", "Id", "Vendedor"],
            vec!["PED", "1", "Ana"],
            vec!["Código", "Nome", "Quantidade", "Preço Venda", "Juros/Desc."],
            vec!["A", "Um", "2", "5", "0"],
        ]);

        let (orders, items, log) = run(&grid);
        assert_eq!(orders.len(), 1);
        assert_eq!(items.len(), 1);
        assert_eq!(
            log.with_severity(crate::audit::Severity::Warning).count(),
            1
        );
    }

    #[test]
    fn test_spacer_rows_without_code_skipped() {
        let grid = RawGrid::from_rows(vec![
            vec![""],
            vec![""],
            vec![""],
            vec!["Tipo", "Id", "Vendedor"],
            vec!["PED", "1", "Ana"],
            vec![""],
            vec!["Código", "Nome", "Quantidade", "Preço Venda", "Juros/Desc."],
            vec!["", "continuação da descrição", "", "", ""],
            vec!["A", "Um", "1", "2", "0"],
        ]);

        let (_orders, items, _log) = run(&grid);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].code, "A");
    }
}
